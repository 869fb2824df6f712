//! Batch mailer: send each address in EMAILS its voting URL from URLS.
//!
//! The two files must have the same length; mismatches abort before any
//! mail is sent. All messages go out over one SMTP connection, so a
//! transport failure aborts the remaining sends.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lettre::{message::Mailbox, Transport};

use anonvote_backend::mailer::{
    apply_window, build_message, confirm_template, connect, pair_lists, read_lines, MailerError,
};

const PROGRAM_NAME: &str = "mailer";

const ABOUT_TEXT: &str = "Send templated voting invitations to a list of email addresses,
one unique voting URL each.

Exits with status 1 on unreadable input, mismatched list lengths,
or an empty batch after --skip/--limit.";

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
            Arg::new("URLS")
                .help("File with one voting URL per line, same order as EMAILS")
                .required(true),
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
    let urls_path: &String = args.get_one("URLS").unwrap();
    let host: &String = args.get_one("host").unwrap();
    let port: u16 = *args.get_one("port").unwrap();
    let sender: &String = args.get_one("sender").unwrap();
    let title: &String = args.get_one("title").unwrap();
    let skip: usize = *args.get_one("skip").unwrap();
    let limit: usize = *args.get_one("limit").unwrap();
    let quiet = args.get_flag("quiet");

    if !quiet && !confirm_template(sender, title)? {
        println!("Then try again.");
        std::process::exit(1);
    }

    let emails = read_lines(emails_path)?;
    let urls = read_lines(urls_path)?;
    let todo = apply_window(pair_lists(emails, urls)?, skip, limit)?;

    let sender: Mailbox = sender.parse()?;
    let smtp = connect(host, port);

    // Print the summary however far we got, then report any send failure.
    let mut sent = 0_usize;
    let result = send_batch(&smtp, &sender, title, &todo, &mut sent);
    println!("Sent {sent} emails.");
    result
}

fn send_batch(
    smtp: &lettre::SmtpTransport,
    sender: &Mailbox,
    title: &str,
    todo: &[(String, String)],
    sent: &mut usize,
) -> Result<(), MailerError> {
    for (email, url) in todo {
        println!("{email} {url}");
        let message = build_message(sender, email, title, url)?;
        smtp.send(&message)?;
        *sent += 1;
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
