//! Keyed batch mailer: derive one anonymizing key per address and mail each
//! recipient a form link carrying their key.
//!
//! The key is an HMAC-SHA256 digest of the address under an
//! election-specific secret entered without echo. The run's only retained
//! output is the sorted key list, deliberately printed without the
//! addresses, so the operator can recognize valid responses later without
//! being able to map them back to people.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lettre::{message::Mailbox, Transport};

use anonvote_backend::mailer::{
    apply_window, build_message, confirm_template, connect, read_lines, KeyDeriver, MailerError,
};

const PROGRAM_NAME: &str = "keyed-mailer";

const ABOUT_TEXT: &str = "Send templated voting invitations with per-address anonymizing keys.

Each recipient's link is FORM_URL followed by the HMAC-SHA256 digest of
their address under a secret you enter at runtime. The secret is never
stored; the derived keys are printed (sorted, without addresses) at the
end of the run.";

/// Construct the CLI configuration.
fn cli() -> Command {
    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new("EMAILS")
                .help("File with one recipient address per line")
                .required(true),
        )
        .arg(
            Arg::new("form")
                .long("form")
                .required(true)
                .help("Form base URL the derived key is appended to"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .default_value("localhost")
                .help("SMTP host"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_parser(value_parser!(u16))
                .default_value("25")
                .help("SMTP port"),
        )
        .arg(
            Arg::new("sender")
                .long("sender")
                .required(true)
                .help("Your email address"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .required(true)
                .help("Title of the election"),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Number of initial emails to skip"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Max number of emails to send (0 = no limit)"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("No template preview"),
        )
}

fn run(args: &ArgMatches) -> Result<(), MailerError> {
    // Required arguments are guaranteed present by clap.
    let emails_path: &String = args.get_one("EMAILS").unwrap();
    let form: &String = args.get_one("form").unwrap();
    let host: &String = args.get_one("host").unwrap();
    let port: u16 = *args.get_one("port").unwrap();
    let sender: &String = args.get_one("sender").unwrap();
    let title: &String = args.get_one("title").unwrap();
    let skip: usize = *args.get_one("skip").unwrap();
    let limit: usize = *args.get_one("limit").unwrap();
    let quiet = args.get_flag("quiet");

    let emails = read_lines(emails_path)?;

    if !quiet && !confirm_template(sender, title)? {
        println!("Then try again.");
        std::process::exit(1);
    }

    let secret = rpassword::prompt_password("Enter election-specific secret: ")
        .map_err(MailerError::Terminal)?;
    let deriver = KeyDeriver::new(secret.as_bytes());

    let todo = apply_window(emails, skip, limit)?;

    let sender: Mailbox = sender.parse()?;
    let smtp = connect(host, port);

    // Print the key summary however far we got, then report any send failure.
    let mut keys = Vec::new();
    let result = send_batch(&smtp, &sender, title, form, &deriver, &todo, &mut keys);
    println!("Sent {} emails.  Here are the keys:", keys.len());
    keys.sort();
    for key in keys {
        println!("{key}");
    }
    result
}

fn send_batch(
    smtp: &lettre::SmtpTransport,
    sender: &Mailbox,
    title: &str,
    form: &str,
    deriver: &KeyDeriver,
    todo: &[String],
    keys: &mut Vec<String>,
) -> Result<(), MailerError> {
    for email in todo {
        println!("{email}");
        let key = deriver.derive(email);
        let url = format!("{form}{key}");
        let message = build_message(sender, email, title, &url)?;
        smtp.send(&message)?;
        keys.push(key);
    }
    Ok(())
}

fn main() {
    let args = cli().get_matches();
    if let Err(err) = run(&args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_cli_usage() {
        let command_line = [
            PROGRAM_NAME,
            "--form",
            "https://forms.example.com/vote?key=",
            "--sender",
            "officials@example.com",
            "--title",
            "Committee Election",
            "emails.txt",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(args.get_one::<String>("EMAILS").unwrap(), "emails.txt");
        assert_eq!(
            args.get_one::<String>("form").unwrap(),
            "https://forms.example.com/vote?key="
        );
        assert!(!args.get_flag("quiet"));
    }

    #[test]
    fn bad_cli_usage() {
        // Missing --form.
        let command_line = [
            PROGRAM_NAME,
            "--sender",
            "officials@example.com",
            "--title",
            "Election",
            "emails.txt",
        ];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Unexpected second positional (no URLS file in this variant).
        let command_line = [
            PROGRAM_NAME,
            "--form",
            "https://forms.example.com/",
            "--sender",
            "officials@example.com",
            "--title",
            "Election",
            "emails.txt",
            "urls.txt",
        ];
        cli().try_get_matches_from(command_line).unwrap_err();

        // No arguments at all.
        cli().try_get_matches_from([PROGRAM_NAME]).unwrap_err();
    }
}
