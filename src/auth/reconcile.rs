// src/auth/reconcile.rs

use std::sync::Arc;

use chrono::Utc;

use crate::auth::locks::EmailLocks;
use crate::auth::validation::validate_email;
use crate::db::error::RepositoryError;
use crate::db::models::user::{NewUser, User, UserChanges};
use crate::db::store::UserStore;
use crate::error::AppError;

/// Lien vers un compte fournisseur OAuth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLink {
    pub profile_id: String,
    pub access_token: String,
}

/// Identifiants reçus d'une source de confiance pour un email donné.
/// Le mot de passe arrive déjà hashé: le moteur ne voit jamais de clair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCredential {
    pub email: String,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub google: Option<ProviderLink>,
    pub facebook: Option<ProviderLink>,
    pub avatar_url: Option<String>,
}

impl PartialCredential {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    fn username_or_default(&self) -> String {
        self.username
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSlot {
    Password,
    Google,
    Facebook,
}

impl CredentialSlot {
    pub const ALL: [CredentialSlot; 3] = [
        CredentialSlot::Password,
        CredentialSlot::Google,
        CredentialSlot::Facebook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialSlot::Password => "password",
            CredentialSlot::Google => "google",
            CredentialSlot::Facebook => "facebook",
        }
    }

    pub fn is_filled(self, user: &User) -> bool {
        match self {
            CredentialSlot::Password => user.password_hash.is_some(),
            CredentialSlot::Google => user.google_profile_id.is_some(),
            CredentialSlot::Facebook => user.facebook_profile_id.is_some(),
        }
    }

    pub fn is_offered(self, candidate: &PartialCredential) -> bool {
        match self {
            CredentialSlot::Password => candidate.password_hash.is_some(),
            CredentialSlot::Google => candidate.google.is_some(),
            CredentialSlot::Facebook => candidate.facebook.is_some(),
        }
    }

    fn write(self, candidate: &PartialCredential, changes: &mut UserChanges) {
        match self {
            CredentialSlot::Password => {
                changes.password_hash.clone_from(&candidate.password_hash);
            }
            CredentialSlot::Google => {
                if let Some(link) = &candidate.google {
                    changes.google_profile_id = Some(link.profile_id.clone());
                    changes.google_access_token = Some(link.access_token.clone());
                }
            }
            CredentialSlot::Facebook => {
                if let Some(link) = &candidate.facebook {
                    changes.facebook_profile_id = Some(link.profile_id.clone());
                    changes.facebook_access_token = Some(link.access_token.clone());
                }
            }
        }
    }
}

/// Slots à lier sur un compte existant, et l'UPDATE correspondant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub slots: Vec<CredentialSlot>,
    pub changes: UserChanges,
}

/// Calcule la fusion d'un candidat dans un compte existant.
///
/// Seuls les slots vides du compte et présents chez le candidat sont écrits;
/// un slot déjà rempli n'est jamais remplacé. Retourne `None` quand il n'y a
/// rien à écrire (compte entièrement lié, ou candidat n'apportant rien de neuf).
pub fn plan_merge(stored: &User, candidate: &PartialCredential) -> Option<MergePlan> {
    if CredentialSlot::ALL.iter().all(|slot| slot.is_filled(stored)) {
        return None;
    }

    let mut changes = UserChanges::default();
    let mut slots = Vec::new();
    for slot in CredentialSlot::ALL {
        if !slot.is_filled(stored) && slot.is_offered(candidate) {
            slot.write(candidate, &mut changes);
            slots.push(slot);
        }
    }

    if slots.is_empty() {
        return None;
    }

    changes.avatar_url.clone_from(&candidate.avatar_url);
    changes.updated_at = Some(Utc::now());
    Some(MergePlan { slots, changes })
}

impl From<&PartialCredential> for NewUser {
    fn from(candidate: &PartialCredential) -> Self {
        let (google_profile_id, google_access_token) = split_link(candidate.google.as_ref());
        let (facebook_profile_id, facebook_access_token) = split_link(candidate.facebook.as_ref());

        NewUser {
            email: candidate.email.clone(),
            username: candidate.username_or_default(),
            password_hash: candidate.password_hash.clone(),
            google_profile_id,
            google_access_token,
            facebook_profile_id,
            facebook_access_token,
            avatar_url: candidate.avatar_url.clone(),
        }
    }
}

fn split_link(link: Option<&ProviderLink>) -> (Option<String>, Option<String>) {
    link.map_or((None, None), |l| {
        (Some(l.profile_id.clone()), Some(l.access_token.clone()))
    })
}

/// Résout le compte canonique d'un email à partir d'identifiants de n'importe quelle source.
///
/// Une lecture et au plus une écriture par appel. Le read-modify-write est
/// sérialisé par email dans le processus; entre processus, l'index unique du
/// store fait échouer le second INSERT, qui est alors rejoué comme une mise à jour.
pub struct IdentityReconciler {
    store: Arc<dyn UserStore>,
    locks: EmailLocks,
}

impl IdentityReconciler {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            locks: EmailLocks::new(),
        }
    }

    pub fn reconcile(&self, candidate: &PartialCredential) -> Result<User, AppError> {
        validate_email(&candidate.email)?;

        self.locks
            .with_lock(&candidate.email, || self.reconcile_locked(candidate))
    }

    fn reconcile_locked(&self, candidate: &PartialCredential) -> Result<User, AppError> {
        if let Some(stored) = self.store.find_by_email(&candidate.email)? {
            return self.link(stored, candidate);
        }

        match self.store.insert(&NewUser::from(candidate)) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, linked = ?user.linked(), "Account created");
                Ok(user)
            }
            Err(RepositoryError::UniqueViolation(_)) => {
                tracing::warn!("Concurrent account creation detected, merging instead");
                let stored = self
                    .store
                    .find_by_email(&candidate.email)?
                    .ok_or_else(|| AppError::persistence("Account vanished after unique violation"))?;
                self.link(stored, candidate)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn link(&self, stored: User, candidate: &PartialCredential) -> Result<User, AppError> {
        let Some(plan) = plan_merge(&stored, candidate) else {
            tracing::debug!(user_id = %stored.id, "Nothing to link, account unchanged");
            return Ok(stored);
        };

        let updated = self.store.update(&stored.email, &plan.changes)?;
        tracing::info!(
            user_id = %updated.id,
            slots = ?plan.slots.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "Credentials linked to existing account"
        );
        Ok(updated)
    }
}
