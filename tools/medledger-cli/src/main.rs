//! MedLedger CLI
//!
//! Operator front-end for the record registry: log in with a wallet
//! address, register users, stage and commit documents, list records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use medledger_cli::{format_listing, format_metrics, format_practitioners};
use medledger_registry::domain::parse_address;
use medledger_registry::{
    FileSessionStore, NewAdmin, NewPatient, PinningBlobStore, RecordIssuanceApi, RecordListing,
    RecordQueryApi, RegistryConfig, RegistryError, RegistryServices, RoleResolutionApi,
    RpcLedgerClient, Session,
};
use medledger_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_types::{ContentId, Role};

type Services = RegistryServices<RpcLedgerClient, PinningBlobStore>;

/// MedLedger: medical record registry CLI
#[derive(Parser, Debug)]
#[command(name = "medledger", version)]
#[command(about = "Register, issue and retrieve medical records on the ledger")]
struct Args {
    /// Ledger JSON-RPC endpoint (overrides MEDLEDGER_LEDGER_URL)
    #[arg(long, global = true)]
    ledger_url: Option<String>,

    /// Session file (overrides MEDLEDGER_SESSION_PATH)
    #[arg(long, global = true)]
    session_path: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Dump Prometheus metrics to stderr before exiting
    #[arg(long, global = true)]
    emit_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an account's role and save the session
    Login {
        /// Wallet address
        account: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the saved session
    Whoami,
    /// Resolve the role of any address
    Role { address: String },
    /// Phase 1: upload a document, print its content id
    Stage {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        name: String,
    },
    /// Phase 2: mint a record for a staged document
    Commit {
        #[arg(long)]
        content_id: String,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        name: String,
    },
    /// Check whether an unconfirmed commit landed
    Reconcile {
        #[arg(long)]
        content_id: String,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        name: String,
    },
    /// Records of a patient (default: the session account)
    Records {
        #[arg(long)]
        patient: Option<String>,
    },
    /// Every record on the ledger
    AllRecords,
    /// Retry specific record ids
    Fetch { record_ids: Vec<u64> },
    /// Registry counts
    Metrics,
    /// Register an admin (admin only)
    AddAdmin {
        #[arg(long)]
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        institution: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        qualification: String,
    },
    /// Register a patient (admin only)
    AddPatient {
        #[arg(long)]
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        phone: String,
    },
    /// Practitioner directory
    Doctors,
    /// Profile of the session account
    Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("cli"))
        .context("failed to initialise telemetry")?;

    let mut config = RegistryConfig::from_env();
    if let Some(url) = &args.ledger_url {
        config.ledger_endpoint = url.clone();
    }
    if let Some(path) = &args.session_path {
        config.session_path = path.clone();
    }
    config.validate()?;

    let ledger = Arc::new(RpcLedgerClient::from_config(&config)?);
    let blobs = Arc::new(PinningBlobStore::from_config(&config)?);
    let services = RegistryServices::new(ledger, blobs, &config);
    let store = FileSessionStore::new(&config.session_path);

    let result = run(&args, &services, &store).await;

    if args.emit_metrics {
        eprintln!("{}", encode_metrics()?);
    }
    result
}

async fn run(args: &Args, services: &Services, store: &FileSessionStore) -> Result<()> {
    // Login and logout never read the saved session.
    match &args.command {
        Command::Login { account } => {
            let mut session = Session::connect(parse_address("account", account)?);
            let role = services.roles.login(&mut session, store).await?;
            if role == Role::Unregistered {
                println!("{account} is not registered; session not saved");
            } else {
                println!("Logged in as {role}");
            }
            Ok(())
        }
        Command::Logout => {
            services.roles.logout_stored(store).await?;
            println!("Logged out");
            Ok(())
        }
        command => {
            let session = services
                .roles
                .restore(store)
                .await
                .context("saved session is unreadable; run `medledger logout` or log in again")?;
            run_with_session(args, command, services, &session).await
        }
    }
}

async fn run_with_session(
    args: &Args,
    command: &Command,
    services: &Services,
    session: &Session,
) -> Result<()> {
    match command {
        Command::Login { .. } | Command::Logout => {}
        Command::Whoami => match session.to_persisted() {
            Some(entry) if args.json => println!("{}", serde_json::to_string_pretty(&entry)?),
            Some(entry) => println!("{} ({})", entry.account, entry.role),
            None => println!("Not logged in"),
        },
        Command::Role { address } => {
            let address = parse_address("address", address)?;
            let role = services.roles.resolve(session, &address).await?;
            println!("{role}");
        }
        Command::Stage {
            file,
            patient,
            name,
        } => {
            let bytes = tokio::fs::read(file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let content_id = services.issuer.stage(bytes, patient, name).await?;
            println!("{content_id}");
        }
        Command::Commit {
            content_id,
            patient,
            name,
        } => {
            let patient = parse_address("patient", patient)?;
            let content_id = ContentId::new(content_id.as_str());
            match services
                .issuer
                .commit(session, &content_id, &patient, name)
                .await
            {
                Ok(record_id) => println!("Record #{record_id} committed"),
                Err(e) if e.is_outcome_unknown() => bail!(
                    "{e}\nRun `medledger reconcile --content-id {content_id} --patient {patient} --name \"{name}\"` before retrying"
                ),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Reconcile {
            content_id,
            patient,
            name,
        } => {
            let patient = parse_address("patient", patient)?;
            let content_id = ContentId::new(content_id.as_str());
            match services
                .issuer
                .reconcile(&content_id, &patient, name)
                .await?
            {
                Some(record_id) => println!("Committed as record #{record_id}"),
                None => println!("No matching record; safe to commit again"),
            }
        }
        Command::Records { patient } => {
            let patient = match patient {
                Some(p) => parse_address("patient", p)?,
                None => session.require_account()?,
            };
            let listing = services.records.list_for_patient(&patient).await;
            print_listing(args.json, listing)?;
        }
        Command::AllRecords => {
            let listing = services.records.list_all().await;
            print_listing(args.json, listing)?;
        }
        Command::Fetch { record_ids } => {
            let listing = services.records.fetch_records(record_ids).await;
            print_listing(args.json, Ok(listing))?;
        }
        Command::Metrics => {
            let snapshot = services.metrics.snapshot().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", format_metrics(&snapshot));
            }
        }
        Command::AddAdmin {
            address,
            name,
            institution,
            department,
            qualification,
        } => {
            let admin = NewAdmin {
                address: parse_address("address", address)?,
                name: name.clone(),
                institution: institution.clone(),
                department: department.clone(),
                qualification: qualification.clone(),
            };
            services.registration.register_admin(session, admin).await?;
            println!("Admin {address} registered");
        }
        Command::AddPatient {
            address,
            name,
            age,
            phone,
        } => {
            let patient = NewPatient {
                address: parse_address("address", address)?,
                name: name.clone(),
                age: *age,
                phone_number: phone.clone(),
            };
            services
                .registration
                .register_patient(session, patient)
                .await?;
            println!("Patient {address} registered");
        }
        Command::Doctors => {
            let entries = services.directory.practitioners().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", format_practitioners(&entries));
            }
        }
        Command::Profile => match session.role() {
            Some(Role::Admin) => {
                let profile = services.directory.my_admin_profile(session).await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
            Some(Role::Patient) => {
                let profile = services.directory.my_patient_profile(session).await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
            _ => bail!("log in with a registered account first"),
        },
    }
    Ok(())
}

fn print_listing(json: bool, listing: Result<RecordListing, RegistryError>) -> Result<()> {
    let listing = match listing {
        Ok(listing) => listing,
        Err(e) if e.is_not_found() => {
            println!("No records found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing.views)?);
        for failure in &listing.failures {
            eprintln!("record #{} failed: {}", failure.record_id, failure.cause);
        }
    } else {
        print!("{}", format_listing(&listing));
    }
    Ok(())
}
