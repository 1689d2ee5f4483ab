use booking_sdk::models::{BookingRequest, LoginRequest, RoleAssignment, RoomSearch};
use booking_sdk::notifications::{self, Notification};
use booking_sdk::session::token_from_login;
use booking_sdk::{
    extract_error, ApiClient, ApiError, ApiResponse, ClientConfig, FileStore, IntegrationKeys,
    NotificationPoller, Session, SessionError, Toggled, Wishlist,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use booking_gateway::lifecycle::Shutdown;

#[derive(Parser)]
#[command(name = "booking-cli")]
#[command(about = "Command-line client for the booking API", long_about = None)]
struct Cli {
    /// Gateway origin.
    #[arg(short, long, env = "BOOKING_API_ORIGIN", default_value = "http://localhost:3000")]
    origin: String,

    /// File holding the session token and wishlists.
    #[arg(short, long, env = "BOOKING_SESSION_FILE", default_value = ".booking-session.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse rooms
    Rooms {
        #[command(subcommand)]
        command: RoomsCommand,
    },
    /// Book a room (dates as YYYY-MM-DD)
    Book {
        room: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// List your bookings
    Bookings,
    /// Cancel one of your bookings
    Cancel { id: String },
    /// Start payment for a booking
    Pay { booking: String },
    /// Check a payment intent
    PaymentStatus { intent: String },
    /// Contact inbox (admin)
    Messages,
    /// Grant the admin role to a user (admin)
    Promote { user: String },
    /// List room services
    Services,
    /// Saved rooms
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommand,
    },
    /// Show current notifications once
    Notifications,
    /// Poll notifications until interrupted
    Watch,
    /// Show which integration keys are configured
    Integrations,
}

#[derive(Subcommand)]
enum RoomsCommand {
    List,
    Get {
        id: String,
    },
    Search {
        #[arg(long = "type")]
        room_type: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Comma-separated service ids
        #[arg(long)]
        services: Option<String>,
    },
}

#[derive(Subcommand)]
enum WishlistCommand {
    List,
    /// Save or unsave a room by id
    Toggle { room: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api) => {
                    eprintln!("Error: {}", extract_error(api));
                    if api.is_unauthorized() {
                        eprintln!("Session rejected, sign in again with `booking-cli login`");
                    }
                }
                None => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileStore::open(&cli.session)?);
    let session = Session::new(store.clone());
    let client = Arc::new(ApiClient::new(ClientConfig::new(cli.origin), store.clone())?);

    match cli.command {
        Commands::Login { email, password } => {
            let response = client.login(&LoginRequest { email, password }).await?;
            let token = token_from_login(&response.data).ok_or(SessionError::MissingToken)?;
            let user = session.sign_in(&token)?;
            println!("Signed in as {} ({:?})", user.email, user.role);
            println!("Session saved to {}", store.path().display());
        }
        Commands::Logout => {
            session.sign_out()?;
            println!("Signed out");
        }
        Commands::Whoami => match session.current_user() {
            Some(user) => print_json(&serde_json::to_value(user)?)?,
            None => println!("Not signed in"),
        },
        Commands::Rooms { command } => {
            let response = match command {
                RoomsCommand::List => client.get_rooms().await?,
                RoomsCommand::Get { id } => client.get_room(id).await?,
                RoomsCommand::Search {
                    room_type,
                    min_price,
                    max_price,
                    from,
                    to,
                    services,
                } => {
                    let search = RoomSearch {
                        room_type,
                        min_price,
                        max_price,
                        from,
                        to,
                        services,
                    };
                    client.search_rooms(&search).await?
                }
            };
            print_response(response)?;
        }
        Commands::Book { room, from, to } => {
            let request = BookingRequest {
                room_id: room,
                start_date: midnight(from),
                end_date: midnight(to),
            };
            print_response(client.create_booking(&request).await?)?;
        }
        Commands::Bookings => print_response(client.my_bookings().await?)?,
        Commands::Cancel { id } => print_response(client.cancel_booking(id).await?)?,
        Commands::Pay { booking } => {
            print_response(client.create_payment_intent(booking).await?)?
        }
        Commands::PaymentStatus { intent } => {
            print_response(client.check_payment_status(&intent).await?)?
        }
        Commands::Messages => print_response(client.get_messages().await?)?,
        Commands::Promote { user } => {
            print_response(client.assign_role(user, &RoleAssignment::admin()).await?)?
        }
        Commands::Services => print_response(client.get_services().await?)?,
        Commands::Wishlist { command } => {
            let wishlist = Wishlist::new(session);
            match command {
                WishlistCommand::List => print_json(&Value::Array(wishlist.items()))?,
                WishlistCommand::Toggle { room } => {
                    let room = client.get_room(&room).await?.into_data();
                    match wishlist.toggle(room)? {
                        Toggled::Added => println!("Saved"),
                        Toggled::Removed => println!("Removed"),
                    }
                }
            }
        }
        Commands::Notifications => {
            let user = session.current_user().ok_or("not signed in")?;
            print_notifications(&notifications::collect(&client, &user).await?);
        }
        Commands::Watch => {
            if !session.is_signed_in() {
                return Err("not signed in".into());
            }
            watch(client, session).await;
        }
        Commands::Integrations => {
            let keys = IntegrationKeys::from_env();
            let state = |set: bool| if set { "set" } else { "missing" };
            println!("oauth client id:         {}", state(keys.oauth_client_id.is_some()));
            println!("payment publishable key: {}", state(keys.payment_publishable_key.is_some()));
            println!("ai completion key:       {}", state(keys.ai_completion_key.is_some()));
        }
    }

    Ok(())
}

async fn watch(client: Arc<ApiClient>, session: Session) {
    let shutdown = Shutdown::new();
    let mut interrupted = shutdown.subscribe();
    let (poller, mut feed) = NotificationPoller::new(client, session);
    let poller = tokio::spawn(poller.run(shutdown.subscribe()));
    shutdown.trigger_on_signal();

    loop {
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                print_notifications(&feed.borrow_and_update());
            }
            _ = interrupted.recv() => break,
        }
    }

    shutdown.trigger();
    let _ = poller.await;
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn print_response(response: ApiResponse) -> Result<(), serde_json::Error> {
    print_json(&response.data)
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_notifications(feed: &[Notification]) {
    if feed.is_empty() {
        println!("No notifications");
        return;
    }
    for n in feed {
        let date = n
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<16} {:<12} {}", date, n.title, n.description);
    }
}
