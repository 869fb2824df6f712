//! Shared logic for the batch mailer binaries.
//!
//! Both tools read line-delimited input files, window the work with
//! skip/limit, and push one templated message per recipient down a single
//! SMTP connection. The keyed variant additionally derives one anonymizing
//! key per address from an operator secret.

use std::io::{self, Write};

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use lettre::{message::Mailbox, Message, SmtpTransport};
use sha2::Sha256;
use thiserror::Error;

pub type HmacSha256 = Hmac<Sha256>;

/// Errors fatal to a mailer run. Every one of these exits the process with
/// status 1; there are no retries.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("failed to read {path}: {source}")]
    Input { path: String, source: io::Error },
    #[error(
        "the emails and urls files should have the same length\n\
         however there are {emails} email addresses and {urls} urls"
    )]
    LengthMismatch { emails: usize, urls: usize },
    #[error("all messages are skipped")]
    NothingToSend,
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error(transparent)]
    Message(#[from] lettre::error::Error),
    #[error("mail transport failure: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("failed to read from the terminal: {0}")]
    Terminal(#[source] io::Error),
}

/// Read a line-delimited input file.
pub fn read_lines(path: &str) -> Result<Vec<String>, MailerError> {
    let contents = std::fs::read_to_string(path).map_err(|source| MailerError::Input {
        path: path.to_string(),
        source,
    })?;
    Ok(contents.lines().map(str::to_string).collect())
}

/// Pair each email with its URL. A length mismatch is fatal before any mail
/// is sent.
pub fn pair_lists(
    emails: Vec<String>,
    urls: Vec<String>,
) -> Result<Vec<(String, String)>, MailerError> {
    if emails.len() != urls.len() {
        return Err(MailerError::LengthMismatch {
            emails: emails.len(),
            urls: urls.len(),
        });
    }
    Ok(emails.into_iter().zip(urls).collect())
}

/// Skip a prefix and cap the batch size (`limit` 0 means no limit).
/// An empty remaining batch is fatal.
pub fn apply_window<T>(items: Vec<T>, skip: usize, limit: usize) -> Result<Vec<T>, MailerError> {
    let limit = if limit > 0 { limit } else { usize::MAX };
    let windowed: Vec<T> = items.into_iter().skip(skip).take(limit).collect();
    if windowed.is_empty() {
        return Err(MailerError::NothingToSend);
    }
    Ok(windowed)
}

/// Derives anonymizing keys: one HMAC-SHA256 digest of each email address,
/// keyed by an election-specific secret.
///
/// The keyed state is cloned before every derivation so each digest is
/// computed from a fresh instance; updating one shared instance across
/// addresses would leak each address into every later digest.
pub struct KeyDeriver {
    mac: HmacSha256,
}

impl KeyDeriver {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            mac: HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length"),
        }
    }

    /// Derive the key for one address: clone the keyed state, feed the
    /// address, render the digest as lowercase hex.
    pub fn derive(&self, email: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(email.as_bytes());
        HEXLOWER.encode(&mac.finalize().into_bytes())
    }
}

/// Render the invitation body for one recipient.
pub fn message_body(email: &str, title: &str, url: &str) -> String {
    format!(
        "Dear {email},\n\
         \n\
         You are invited to vote in an election:\n\
         \n\
         \x20 {title}\n\
         \n\
         Please go here to vote:\n\
         \n\
         \x20 {url}\n\
         \n\
         Sincerely,\n\
         \n\
         The Election Officials.\n"
    )
}

/// Build the full message for one recipient.
pub fn build_message(
    sender: &Mailbox,
    email: &str,
    title: &str,
    url: &str,
) -> Result<Message, MailerError> {
    let message = Message::builder()
        .from(sender.clone())
        .to(email.parse()?)
        .subject(format!("Please vote! -- {title}"))
        .body(message_body(email, title, url))?;
    Ok(message)
}

/// Show the template with placeholder values and ask for confirmation.
/// An empty answer counts as yes.
pub fn confirm_template(sender: &str, title: &str) -> Result<bool, MailerError> {
    println!("The email sent out will look like this:");
    println!("{}", "-".repeat(70));
    println!("From: {sender}");
    println!("Subject: Please vote! -- {title}");
    println!("To: <email address>");
    println!();
    print!(
        "{}",
        message_body("<email address>", title, "<voting url>")
    );
    println!("{}", "-".repeat(70));

    print!("Are you happy with this email? [Y/n] ");
    io::stdout().flush().map_err(MailerError::Terminal)?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(MailerError::Terminal)?;
    let answer = answer.trim();
    Ok(answer.is_empty() || answer.starts_with(['y', 'Y']))
}

/// Open a single plaintext SMTP connection, shared by the whole run.
pub fn connect(host: &str, port: u16) -> SmtpTransport {
    SmtpTransport::builder_dangerous(host).port(port).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_rejects_mismatched_lengths() {
        let emails = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let urls = vec!["https://vote/1".to_string()];
        match pair_lists(emails, urls) {
            Err(MailerError::LengthMismatch { emails: 2, urls: 1 }) => {}
            other => panic!("expected length mismatch, got {other:?}"),
        }
    }

    #[test]
    fn pairing_zips_equal_lists() {
        let emails = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let urls = vec!["https://vote/1".to_string(), "https://vote/2".to_string()];
        let pairs = pair_lists(emails, urls).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("a@example.com".to_string(), "https://vote/1".to_string()));
    }

    #[test]
    fn window_skips_and_limits() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(apply_window(items.clone(), 0, 0).unwrap(), items);
        assert_eq!(apply_window(items.clone(), 3, 0).unwrap(), (3..10).collect::<Vec<_>>());
        assert_eq!(apply_window(items.clone(), 0, 4).unwrap(), (0..4).collect::<Vec<_>>());
        assert_eq!(apply_window(items.clone(), 3, 4).unwrap(), (3..7).collect::<Vec<_>>());
    }

    #[test]
    fn window_rejects_empty_batches() {
        assert!(matches!(
            apply_window(Vec::<u32>::new(), 0, 0),
            Err(MailerError::NothingToSend)
        ));
        assert!(matches!(
            apply_window(vec![1, 2, 3], 3, 0),
            Err(MailerError::NothingToSend)
        ));
    }

    #[test]
    fn derivation_is_deterministic_per_secret_and_address() {
        let deriver = KeyDeriver::new(b"hunter2");
        let again = KeyDeriver::new(b"hunter2");
        assert_eq!(
            deriver.derive("alice@example.com"),
            again.derive("alice@example.com")
        );
    }

    #[test]
    fn distinct_addresses_get_distinct_keys() {
        let deriver = KeyDeriver::new(b"hunter2");
        assert_ne!(
            deriver.derive("alice@example.com"),
            deriver.derive("bob@example.com")
        );
    }

    #[test]
    fn distinct_secrets_get_distinct_keys() {
        let deriver = KeyDeriver::new(b"hunter2");
        let other = KeyDeriver::new(b"hunter3");
        assert_ne!(
            deriver.derive("alice@example.com"),
            other.derive("alice@example.com")
        );
    }

    #[test]
    fn derivations_do_not_leak_state_between_addresses() {
        // Deriving for earlier addresses must not affect later digests.
        let deriver = KeyDeriver::new(b"hunter2");
        let fresh = KeyDeriver::new(b"hunter2");
        let _ = deriver.derive("alice@example.com");
        let _ = deriver.derive("bob@example.com");
        assert_eq!(
            deriver.derive("carol@example.com"),
            fresh.derive("carol@example.com")
        );
    }

    #[test]
    fn derivation_matches_the_hmac_sha256_test_vector() {
        // RFC 2104-style known answer for HMAC-SHA256("key", ...).
        let deriver = KeyDeriver::new(b"key");
        assert_eq!(
            deriver.derive("The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn body_contains_the_address_title_and_link() {
        let body = message_body("alice@example.com", "Committee Election", "https://vote/abc");
        assert!(body.starts_with("Dear alice@example.com,"));
        assert!(body.contains("  Committee Election\n"));
        assert!(body.contains("  https://vote/abc\n"));
        assert!(body.ends_with("The Election Officials.\n"));
    }

    #[test]
    fn messages_build_for_valid_addresses() {
        let sender: Mailbox = "Election Officials <officials@example.com>".parse().unwrap();
        build_message(&sender, "alice@example.com", "Election", "https://vote/abc").unwrap();
        assert!(matches!(
            build_message(&sender, "not an address", "Election", "https://vote/abc"),
            Err(MailerError::Address(_))
        ));
    }
}
