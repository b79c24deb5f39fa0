use clap::Parser;
use mail_sift::domain::ports::EmailStore;
use mail_sift::utils::logger;
use mail_sift::SqliteEmailStore;

#[derive(Parser)]
#[command(name = "inbox-report")]
#[command(about = "Show archived recruiter emails, newest first")]
struct Args {
    /// Path to the archive database
    #[arg(short, long, default_value = "mail-sift.db")]
    db_path: String,

    /// Show at most this many rows
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let store = SqliteEmailStore::new(&args.db_path);
    let mut emails = match store.recruiter_emails() {
        Ok(emails) => emails,
        Err(e) => {
            eprintln!("❌ Failed to read the archive '{}': {}", args.db_path, e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Some(limit) = args.limit {
        emails.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&emails)?);
        return Ok(());
    }

    if emails.is_empty() {
        println!("📥 No recruiter emails in the archive yet");
        return Ok(());
    }

    println!("📊 {} recruiter email(s) archived:", emails.len());
    println!();

    for email in &emails {
        let company = email
            .posting
            .as_ref()
            .and_then(|p| p.company_name.as_deref())
            .unwrap_or("?");
        let role = email
            .posting
            .as_ref()
            .and_then(|p| p.role_title.as_deref())
            .unwrap_or("?");

        println!("📨 {}", email.subject);
        println!("  From: {}", email.sender);
        println!(
            "  Received: {}",
            email.received_date.format("%Y-%m-%d %H:%M")
        );
        println!("  Company: {} / Role: {}", company, role);
        if email.is_followup {
            println!("  ⏭️ Follow-up to an earlier thread");
        }
        if email.draft_reply.is_some() {
            println!("  ✉️ Decline draft archived");
        }
        println!();
    }

    Ok(())
}
