use chrono::{DateTime, Utc};

/// Jeton de réinitialisation émis pour un compte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Livraison du lien de réinitialisation (email, file de messages...).
pub trait ResetMailer: Send + Sync {
    fn send(&self, ticket: &ResetTicket, reset_url: &str);
}

/// Aucun transport: trace la demande. Le lien, qui vaut un mot de passe,
/// n'est écrit (en debug) que si `reveal_link` est vrai, c'est-à-dire hors production.
pub struct LogMailer {
    reveal_link: bool,
}

impl LogMailer {
    pub fn new(reveal_link: bool) -> Self {
        Self { reveal_link }
    }

    fn loggable_link<'a>(&self, reset_url: &'a str) -> &'a str {
        if self.reveal_link {
            reset_url
        } else {
            "[redacted]"
        }
    }
}

impl ResetMailer for LogMailer {
    fn send(&self, ticket: &ResetTicket, reset_url: &str) {
        tracing::info!(
            email = %ticket.email,
            expires_at = %ticket.expires_at,
            "Password reset requested (no mail transport configured)"
        );
        tracing::debug!(reset_url = self.loggable_link(reset_url), "Reset link");
    }
}
