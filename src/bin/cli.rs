//! luakv CLI Client
//!
//! Command-line interface over the typed client.

use clap::{Parser, Subcommand};
use luakv::{Client, Config, Data, SetOptions};
use tracing_subscriber::{fmt, EnvFilter};

/// luakv CLI
#[derive(Parser, Debug)]
#[command(name = "luakv-cli")]
#[command(about = "CLI for Redis-compatible stores through luakv")]
#[command(version)]
struct Args {
    /// Store host
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Store port
    #[arg(short, long, env = "REDIS_PORT", default_value_t = 6379)]
    port: u16,

    /// Password for AUTH
    #[arg(long, env = "REDIS_PSW")]
    password: Option<String>,

    /// ACL user name
    #[arg(long, env = "REDIS_USERNAME")]
    username: Option<String>,

    /// Database index
    #[arg(short = 'n', long, env = "REDIS_DB", default_value_t = 0)]
    db: u32,

    /// Socket timeout in milliseconds (0 = none)
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the store
    Ping,

    /// Get a value by key
    Get {
        key: String,

        /// Convert the value (int, float, bool, int_any, ...)
        #[arg(short, long)]
        convert: Option<String>,
    },

    /// Set a key; several values store a list
    Set {
        key: String,

        #[arg(required = true)]
        values: Vec<String>,

        /// Time to live in seconds
        #[arg(long)]
        ex: Option<u64>,

        /// Time to live in milliseconds
        #[arg(long)]
        px: Option<u64>,

        /// Only write if the key exists
        #[arg(long, conflicts_with = "nx")]
        xx: bool,

        /// Only write if the key does not exist
        #[arg(long)]
        nx: bool,

        /// Keep the existing expiry
        #[arg(long)]
        keep_ttl: bool,

        /// Print the previous value
        #[arg(long)]
        get: bool,
    },

    /// Delete keys
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Rename a key
    Rename { key: String, new_key: String },

    /// Remaining time to live in milliseconds
    Ttl { key: String },

    /// Expire a key after some milliseconds
    Expire { key: String, ms: u64 },

    /// Remove a key's expiry
    Persist { key: String },

    /// Remove every key in the selected database
    Flush,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .host(&args.host)
        .port(args.port)
        .db(args.db)
        .socket_timeout_ms(args.timeout_ms)
        .max_connections(1);
    if let Some(password) = &args.password {
        builder = builder.password(password);
    }
    if let Some(username) = &args.username {
        builder = builder.username(username);
    }

    let client = match Client::open(builder.build()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("(error) {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command) {
        eprintln!("(error) {}", e);
        std::process::exit(1);
    }
    client.close();
}

fn run(client: &Client, command: Commands) -> luakv::Result<()> {
    match command {
        Commands::Ping => println!("{}", if client.ping() { "PONG" } else { "(no reply)" }),
        Commands::Get { key, convert } => print_value(client.get(&key, convert.as_deref())?),
        Commands::Set {
            key,
            mut values,
            ex,
            px,
            xx,
            nx,
            keep_ttl,
            get,
        } => {
            let value = if values.len() == 1 {
                Data::string(values.remove(0))
            } else {
                Data::strings(values)
            };
            let mut options = SetOptions::new();
            options.ttl_seconds = ex;
            options.ttl_ms = px;
            options.if_exists = xx;
            options.if_not_exists = nx;
            options.keep_ttl = keep_ttl;
            options.get_old_value = get;

            let old = client.set(&key, value, &options)?;
            if get {
                print_value(old);
            } else {
                println!("OK");
            }
        }
        Commands::Del { keys } => {
            let mut removed = 0;
            for key in &keys {
                if client.delete(key, true, None)?.is_some() {
                    removed += 1;
                }
            }
            println!("(integer) {}", removed);
        }
        Commands::Rename { key, new_key } => {
            let renamed = client.rename_key(&key, &new_key, true)?.unwrap_or(false);
            println!("(integer) {}", renamed as u8);
        }
        Commands::Ttl { key } => match client.get_key_ttl(&key)? {
            None => println!("(integer) -2"),
            Some(0) => println!("(integer) -1"),
            Some(ms) => println!("(integer) {}", ms),
        },
        Commands::Expire { key, ms } => {
            println!("(integer) {}", client.set_key_ttl(&key, None, Some(ms))? as u8)
        }
        Commands::Persist { key } => println!("(integer) {}", client.drop_key_ttl(&key)? as u8),
        Commands::Flush => {
            let removed = client.remove_all_keys(true)?.unwrap_or(0);
            println!("OK ({} keys removed)", removed);
        }
    }
    Ok(())
}

fn print_value(value: Option<Data>) {
    match value {
        None => println!("(nil)"),
        Some(Data::Scalar(s)) => println!("{}", s),
        Some(Data::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                println!("{}) {}", i + 1, item);
            }
        }
        Some(Data::Set(items)) => {
            for (i, item) in items.iter().enumerate() {
                println!("{}) {}", i + 1, item);
            }
        }
    }
}
