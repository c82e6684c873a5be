use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use med_interpret_lib::workflow::PROCESSING_STEPS;
use med_interpret_lib::{
    export_text, validate_file, write_export, ApiClient, AppContext, ChatSession, ClientConfig,
    FileHandle, Language, Phase, Role, Validation, Workflow,
};

#[derive(Parser)]
#[command(name = "med-interpret")]
#[command(about = "Turn a medical document into plain language")]
struct Cli {
    /// JPG, PNG or PDF document, up to 10MB
    file: PathBuf,

    /// Answer language (en, es, fr, de, it, pt, ar, zh, ja, hi)
    #[arg(long)]
    lang: Option<String>,

    /// Follow-up question; repeat for several
    #[arg(long = "ask")]
    questions: Vec<String>,

    /// Also save the summary as a text file in this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    med_interpret_lib::init();
    let cli = Cli::parse();

    let context = Arc::new(AppContext::hydrate(std::env::var("LANG").ok().as_deref()));
    if let Some(tag) = cli.lang.as_deref() {
        match Language::from_tag(tag) {
            Some(lang) => context.locale.set(lang)?,
            None => eprintln!("Unknown language '{}', using {}", tag, context.language()),
        }
    }
    let language = context.language();

    let file = FileHandle::load(&cli.file).await?;
    if let Validation::Invalid { reason } = validate_file(Some(&file)) {
        eprintln!("{}", reason);
        std::process::exit(2);
    }

    let client = Arc::new(ApiClient::new(ClientConfig::from_env(), context));
    let mut workflow = Workflow::new(Arc::clone(&client));

    let mut updates = workflow.subscribe();
    let file_name = cli.file.display().to_string();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let phase = updates.borrow_and_update().phase().clone();
            match phase {
                Phase::Uploading => println!("Uploading {}...", file_name),
                Phase::Processing { step } => {
                    if let Some(label) = PROCESSING_STEPS.get(step as usize) {
                        println!("  [{}/{}] {}", step + 1, PROCESSING_STEPS.len(), label);
                    }
                }
                Phase::Complete { .. } | Phase::Failed { .. } | Phase::Idle => break,
            }
        }
    });

    let result = workflow.submit(file, Some(language)).await;
    let _ = printer.await;

    let record = match result {
        Ok(record) => record,
        Err(e) => {
            if let Some(message) = e.user_message() {
                eprintln!("{}", message);
            }
            std::process::exit(1);
        }
    };

    println!();
    println!("{}", export_text(&record));

    if let Some(dir) = cli.export_dir.as_deref() {
        let path = write_export(&record, dir).await?;
        println!("\nSaved to {}", path.display());
    }

    if cli.questions.is_empty() {
        return Ok(());
    }

    let mut session = ChatSession::new(record.id.clone(), language);
    for question in &cli.questions {
        if let Err(e) = session.ask(&client, question).await {
            eprintln!("Skipped '{}': {}", question, e);
        }
    }

    println!();
    for message in session.transcript() {
        let who = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        println!("{}: {}\n", who, message.content);
    }

    Ok(())
}
