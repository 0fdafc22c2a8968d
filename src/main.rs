use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use symptom_chat_core::{
    view, ChatClient, ChatId, ChatRole, Composer, Config, MessageView,
};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "symptom-chat")]
#[command(about = "Terminal client for the symptom checker chat service")]
#[command(version)]
struct Cli {
    /// Server base URL (overrides SYMPTOM_CHAT_SERVER and the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat for a conversation
    Chat {
        /// Chat identifier
        chat_id: String,
        /// Name the assistant addresses you by
        #[arg(short, long)]
        name: Option<String>,
        /// Skip loading earlier messages
        #[arg(long)]
        no_history: bool,
    },
    /// Send one message and print the reply
    Send {
        /// Chat identifier
        chat_id: String,
        /// Symptoms to describe
        text: String,
        /// Name the assistant addresses you by
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Start a new conversation
    New {
        /// Conversation title
        #[arg(short, long)]
        title: Option<String>,
    },
    /// List conversations
    List,
    /// Print the stored messages of a conversation
    Show {
        /// Chat identifier
        chat_id: String,
    },
    /// Show or update the saved configuration
    Config {
        /// Display name to save
        #[arg(short, long)]
        name: Option<String>,
        /// Server URL to save
        #[arg(long = "set-server")]
        set_server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    // Configuration is read once here and injected everywhere else
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {}", "Ignoring unreadable config".yellow(), e);
        Config::new()
    });
    let server_url = cli.server.clone().unwrap_or_else(|| config.server_url());

    match cli.command {
        Commands::Chat { chat_id, name, no_history } => {
            let display_name = name.or_else(|| config.display_name().map(str::to_string));
            run_chat(&server_url, ChatId::new(chat_id), display_name, !no_history).await?
        }
        Commands::Send { chat_id, text, name } => {
            let display_name = name.or_else(|| config.display_name().map(str::to_string));
            send_once(&server_url, ChatId::new(chat_id), display_name, &text).await?
        }
        Commands::New { title } => new_chat(&server_url, title.as_deref()).await?,
        Commands::List => list_chats(&server_url).await?,
        Commands::Show { chat_id } => show_chat(&server_url, &ChatId::new(chat_id)).await?,
        Commands::Config { name, set_server } => update_config(config, name, set_server)?,
    }

    Ok(())
}

async fn run_chat(
    server_url: &str,
    chat_id: ChatId,
    display_name: Option<String>,
    with_history: bool,
) -> Result<()> {
    let client = ChatClient::new(server_url)?;
    tracing::info!(%chat_id, %server_url, "starting chat");

    let mut events = tui::EventHandler::new();
    let mut app = App::new(chat_id, display_name, client, events.sender());
    if with_history {
        app.load_history().await;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn send_once(
    server_url: &str,
    chat_id: ChatId,
    display_name: Option<String>,
    text: &str,
) -> Result<()> {
    let client = ChatClient::new(server_url)?;
    let mut composer = Composer::new(chat_id, display_name);
    composer.set_input(text);

    if !composer.send(&client).await {
        return Err(anyhow!("Nothing to send: message is empty"));
    }

    for entry in composer.views() {
        print_view(entry);
    }

    Ok(())
}

fn print_view(entry: &MessageView) {
    match entry {
        MessageView::Text { role, text } => match role {
            ChatRole::User => println!("{}", text.cyan()),
            ChatRole::Assistant => println!("{}", text),
            ChatRole::System => println!("{}", text.dimmed()),
        },
        MessageView::Card(card) => {
            println!("{}", card.conditions.heading.bold().yellow());
            for item in &card.conditions.items {
                println!("  • {}", item);
            }
            if let Some(recommendations) = &card.recommendations {
                println!("{}", recommendations.heading.bold().yellow());
                for item in &recommendations.items {
                    println!("  • {}", item);
                }
            }
            if let Some(disclaimer) = &card.disclaimer {
                println!("{}", disclaimer.dimmed().italic());
            }
        }
    }
    println!();
}

async fn new_chat(server_url: &str, title: Option<&str>) -> Result<()> {
    let client = ChatClient::new(server_url)?;
    let chat = client.create_chat(title).await?;

    let chat_id = chat.chat_id();

    println!("{} {}", "Created chat".bold().green(), chat_id.to_string().bold());
    println!("{}", chat.title.dimmed());
    println!("Open it with: {}", format!("symptom-chat chat {}", chat_id).bold());
    Ok(())
}

async fn list_chats(server_url: &str) -> Result<()> {
    let client = ChatClient::new(server_url)?;
    let chats = client.list_chats().await?;

    if chats.is_empty() {
        println!("{}", "No conversations yet. Start one with: symptom-chat new".yellow());
        return Ok(());
    }

    println!("\n{}", "Conversations".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    for chat in chats {
        println!(
            "{:>5}  {}  {}",
            chat.id.to_string().bold(),
            chat.title,
            chat.created_at.unwrap_or_default().dimmed()
        );
    }
    Ok(())
}

async fn show_chat(server_url: &str, chat_id: &ChatId) -> Result<()> {
    let client = ChatClient::new(server_url)?;
    let history = client.get_chat(chat_id).await?;

    println!("\n{} {}", format!("#{}", history.id).bold().blue(), history.title.bold());
    println!("{}", "=".repeat(30).dimmed());
    for stored in &history.messages {
        print_view(&view::render_message(&stored.to_message()));
    }
    println!("{} messages", history.messages.len().to_string().bold());
    Ok(())
}

fn update_config(mut config: Config, name: Option<String>, set_server: Option<String>) -> Result<()> {
    let changed = name.is_some() || set_server.is_some();
    if let Some(name) = name {
        config.display_name = Some(name).filter(|n| !n.trim().is_empty());
    }
    if let Some(server) = set_server {
        ChatClient::new(&server)?;
        config.server_url = Some(server);
    }
    if changed {
        config.save()?;
        println!("{}", "Configuration saved".green());
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("{} {}", "Path:".dimmed(), Config::config_path()?.display());
    Ok(())
}
