use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use proteuscmd::{
    ProteusClient, Session,
    config::ProteusConfig,
    mapping::map_v4_to_v6,
    proteus::ip::Reservation,
    proteus::properties::Properties,
    proteus::types::{RecordTarget, ReservationStatus, ViewSelector},
    validation::{parse_property_override, validate_mac},
};
use serde_json::{Value, json};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Configuration file (defaults to ~/.proteus.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Log every API request to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host and alias records
    #[command(subcommand)]
    Dns(DnsCommand),
    /// IPv4 and IPv6 address reservations
    #[command(subcommand)]
    Ip(IpCommand),
}

#[derive(Subcommand, Debug)]
enum DnsCommand {
    /// Show the properties of the record for DOMAIN
    Get {
        #[arg(long, value_name = "VIEW", default_value = "all")]
        view: ViewSelector,
        domain: String,
    },
    /// Create a host record (IP targets) or an alias record (one name)
    Set {
        #[arg(long, value_name = "VIEW", default_value = "all")]
        view: ViewSelector,
        domain: String,
        #[arg(required = true, value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Delete the host or alias record for DOMAIN
    Delete {
        #[arg(long, value_name = "VIEW", default_value = "all")]
        view: ViewSelector,
        domain: String,
    },
    /// List the zones directly below ZONE
    Zones {
        #[arg(long, value_name = "VIEW", default_value = "all")]
        view: ViewSelector,
        zone: String,
    },
}

#[derive(Subcommand, Debug)]
enum IpCommand {
    /// Show the reservation of an address (or a name resolving to one)
    Get { target: String },
    /// Reserve an address for a MAC
    Set {
        address: IpAddr,
        #[arg(long, value_name = "MAC", value_parser = validate_mac)]
        mac: String,
        #[arg(long, value_name = "EMAIL")]
        admin_email: String,
        #[arg(long, value_name = "NAME")]
        admin_name: String,
        #[arg(long, value_name = "PHONE")]
        admin_phone: String,
        #[arg(long, value_name = "TEXT")]
        comment: Option<String>,
        /// Also create DNS records for this name
        #[arg(long, value_name = "FQDN")]
        hostname: Option<String>,
        /// Views for --hostname (defaults to all)
        #[arg(long, value_name = "VIEW")]
        view: Option<ViewSelector>,
        #[arg(long, default_value = "STATIC")]
        status: ReservationStatus,
        /// Replace an existing reservation
        #[arg(long)]
        force: bool,
        /// Extra property (repeat for multiple values)
        #[arg(short = 'p', long = "property", value_name = "KEY=VALUE", value_parser = parse_property_override)]
        properties: Vec<(String, String)>,
        /// Also reserve the IPv6 address paired through v4_v6_map
        #[arg(long)]
        with_v6: bool,
    },
    /// Delete the reservation of an address (or a name resolving to one)
    Delete { target: String },
    /// Print the IPv6 address paired with an IPv4 address
    Map { address: Ipv4Addr },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ProteusConfig::default_path()?,
    };
    let config = ProteusConfig::load(&config_path)?;

    // needs no session
    if let Command::Ip(IpCommand::Map { address }) = &cli.command {
        println!("{}", map_address(&config, *address)?);
        return Ok(());
    }

    let client = ProteusClient::from_config(&config)
        .await
        .context("failed to set up Proteus client")?;
    let session = client.login().await.context("login to Proteus failed")?;

    let outcome = match cli.command {
        Command::Dns(cmd) => run_dns(&session, cmd).await,
        Command::Ip(cmd) => run_ip(&session, &config, cmd).await,
    };
    let output = session.finish(outcome).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Runs the command once per selected view, intern before extern.
async fn run_dns(session: &Session, cmd: DnsCommand) -> Result<Value> {
    let selector = match &cmd {
        DnsCommand::Get { view, .. }
        | DnsCommand::Set { view, .. }
        | DnsCommand::Delete { view, .. }
        | DnsCommand::Zones { view, .. } => *view,
    };
    if let DnsCommand::Set { targets, .. } = &cmd {
        RecordTarget::classify(targets.as_slice())?;
    }

    let mut results = Vec::new();
    for view in session.resolve_views(selector).await? {
        info!(view = %view.name, "processing view");
        let result = match &cmd {
            DnsCommand::Get { domain, .. } => json!(session.get_record(view.id, domain).await?),
            DnsCommand::Set {
                domain, targets, ..
            } => session.set_record(view.id, domain, targets.as_slice()).await?,
            DnsCommand::Delete { domain, .. } => {
                json!({ "deleted": session.delete_record(view.id, domain).await? })
            }
            DnsCommand::Zones { zone, .. } => json!(session.list_zones(view.id, zone).await?),
        };
        results.push(json!({ "view": view.name, "result": result }));
    }
    Ok(Value::Array(results))
}

async fn run_ip(session: &Session, config: &ProteusConfig, cmd: IpCommand) -> Result<Value> {
    match cmd {
        IpCommand::Get { target } => {
            let address = resolve_address(&target).await?;
            let conf_id = session.resolve_configuration().await?;
            let container = session.resolve_container(address, conf_id).await?;
            Ok(json!(session.get_address(address, container).await?))
        }
        IpCommand::Delete { target } => {
            let address = resolve_address(&target).await?;
            let conf_id = session.resolve_configuration().await?;
            let container = session.resolve_container(address, conf_id).await?;
            let id = session.delete_address(address, container).await?;
            Ok(json!({ "deleted": id }))
        }
        IpCommand::Set {
            address,
            mac,
            admin_email,
            admin_name,
            admin_phone,
            comment,
            hostname,
            view,
            status,
            force,
            properties: overrides,
            with_v6,
        } => {
            let mut properties = Properties::new();
            properties.insert("admin_email".into(), admin_email);
            properties.insert("admin_name".into(), admin_name);
            properties.insert("admin_phone".into(), admin_phone);
            if let Some(comment) = comment {
                properties.insert("comments".into(), comment);
            }
            if let Some(hostname) = &hostname {
                properties.insert("name".into(), hostname.clone());
            }
            properties.extend(overrides);

            let view = hostname.as_ref().map(|_| view.unwrap_or(ViewSelector::All));
            let reservation = Reservation {
                address,
                status,
                mac,
                properties,
                hostname,
                view,
            };

            // settle the pairing before anything is assigned
            let paired = if with_v6 {
                let IpAddr::V4(v4) = address else {
                    bail!("--with-v6 needs an IPv4 address");
                };
                Some(reservation.paired_v6(map_address(config, v4)?)?)
            } else {
                None
            };

            let conf_id = session.resolve_configuration().await?;
            let mut results = Vec::new();
            for reservation in std::iter::once(&reservation).chain(paired.as_ref()) {
                let result = session
                    .reserve(conf_id, reservation, force)
                    .await
                    .with_context(|| format!("reserving {}", reservation.address))?;
                results.push(result);
            }
            Ok(Value::Array(results))
        }
        IpCommand::Map { address } => Ok(json!(map_address(config, address)?)),
    }
}

fn map_address(config: &ProteusConfig, address: Ipv4Addr) -> Result<Ipv6Addr> {
    map_v4_to_v6(address, &config.v4_v6_map)
        .with_context(|| format!("no v4_v6_map entry covers {address}"))
}

/// Accept an address literal or a name the system resolver knows.
async fn resolve_address(target: &str) -> Result<IpAddr> {
    if let Ok(address) = target.parse() {
        return Ok(address);
    }
    tokio::net::lookup_host((target, 0))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip())
        .with_context(|| format!("'{target}' cannot be resolved to an IPv4 or IPv6 address"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,proteuscmd=debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
