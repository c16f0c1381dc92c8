use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub(crate) enum RunOutcome {
    Serve(fluxo_push::config::AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    let config = fluxo_push::config::AppConfig {
        port: cli.port,
        vapid_public_key: cli.vapid_public_key,
        vapid_private_key: cli.vapid_private_key,
        vapid_subject: cli.vapid_subject,
        api_key: cli.api_key,
        database: cli.database,
        sends_per_second: cli.rate,
    };

    // Missing VAPID keys are a startup error, never a per-request one.
    if let Err(err) = fluxo_push::push::VapidKeys::from_config(&config) {
        eprintln!("error: {err}");
        eprintln!("hint: run `fluxo-push init` to generate a key pair");
        return RunOutcome::Exit(2);
    }

    RunOutcome::Serve(config)
}

#[derive(Parser, Debug)]
#[command(
    name = "fluxo-push",
    version,
    about = "Push notification fan-out service for the Fluxo7 web app"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "FLUXO_PUSH_PORT", default_value_t = 3000)]
    port: u16,
    #[arg(long, env = "FLUXO_PUSH_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "FLUXO_PUSH_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "FLUXO_PUSH_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    /// Shared secret required (as X-API-KEY) on the notify endpoints.
    #[arg(long, env = "FLUXO_PUSH_API_KEY")]
    api_key: Option<String>,
    /// Sqlite file for persisted subscriptions; in-memory when absent.
    #[arg(long, env = "FLUXO_PUSH_DATABASE")]
    database: Option<PathBuf>,
    /// Outbound sends per second; 0 disables the throttle.
    #[arg(long, env = "FLUXO_PUSH_RATE", default_value_t = 10)]
    rate: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match fluxo_push::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("FLUXO_PUSH_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("FLUXO_PUSH_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("FLUXO_PUSH_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace FLUXO_PUSH_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn cli__should_parse_serve_flags() {
        // When
        let cli = Cli::try_parse_from([
            "fluxo-push",
            "--port",
            "4100",
            "--vapid-public-key",
            "pub",
            "--vapid-private-key",
            "priv",
            "--api-key",
            "secret",
            "--rate",
            "0",
        ])
        .expect("parse cli");

        // Then
        assert_eq!(cli.port, 4100);
        assert_eq!(cli.api_key.as_deref(), Some("secret"));
        assert_eq!(cli.rate, 0);
        assert!(cli.database.is_none());
    }

    #[test]
    fn cli__should_parse_init_subcommand() {
        // When
        let cli = Cli::try_parse_from([
            "fluxo-push",
            "init",
            "--subject",
            "mailto:ops@example.com",
        ])
        .expect("parse cli");

        // Then
        match cli.command {
            Some(Command::Init(args)) => {
                assert_eq!(args.subject.as_deref(), Some("mailto:ops@example.com"));
            }
            other => panic!("expected init subcommand, got {other:?}"),
        }
    }
}
