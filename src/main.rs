//! # Catprint CLI
//!
//! Command-line interface for Bluetooth cat printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print an image (requires the `ble` feature)
//! catprint print cat.png --address AA:BB:CC:DD:EE:FF
//!
//! # Go through the whole job without hardware
//! catprint print cat.png --address AA:BB:CC:DD:EE:FF --dry-run
//!
//! # Write the encoded command stream to a file
//! catprint encode cat.png --out cat.bin
//!
//! # See what will come out of the printer
//! catprint preview cat.png --png cat-preview.png --dither floyd-steinberg
//! ```
//!
//! Set `RUST_LOG=debug` to see per-chunk retries.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use catprint::{
    CatprintError, Packet, PrinterProfile, PrinterSession, Raster,
    protocol::encoder,
    render::{self, DitherMethod},
    transport::{DeviceAddress, MemoryLink, TransportLink},
};

/// Catprint - Bluetooth cat printer utility
#[derive(Parser, Debug)]
#[command(name = "catprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an image
    Print {
        #[command(flatten)]
        job: JobArgs,

        /// Printer MAC address (overrides the profile)
        #[arg(long)]
        address: Option<String>,

        /// Run the job against an in-memory link instead of the printer
        #[arg(long)]
        dry_run: bool,

        /// Seconds to keep listening for notifications after sending
        #[arg(long, default_value = "10")]
        linger: u64,
    },

    /// Encode an image and write the command stream to a file
    Encode {
        #[command(flatten)]
        job: JobArgs,

        /// Output file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Save the halftoned image as PNG
    Preview {
        #[command(flatten)]
        job: JobArgs,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Read the printer's status characteristic
    #[cfg(feature = "ble")]
    Status {
        /// Printer MAC address (overrides the profile)
        #[arg(long)]
        address: Option<String>,

        /// Printer profile (JSON)
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Image file to print
    image: PathBuf,

    /// Printer profile (JSON)
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Halftoning method
    #[arg(long, value_enum, default_value_t = DitherMethod::JarvisJudiceNinke)]
    dither: DitherMethod,

    /// Print width in dots (defaults to the profile's)
    #[arg(long)]
    width: Option<usize>,

    /// Maximum height in rows (defaults to the profile's)
    #[arg(long)]
    max_height: Option<usize>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CatprintError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print {
            job,
            address,
            dry_run,
            linger,
        } => {
            let (profile, raster) = prepare_job(&job)?;
            let packet = encoder::generate(&raster);
            let address = resolve_address(address.as_deref(), &profile)?;
            print(&profile, address, &packet, dry_run, Duration::from_secs(linger)).await?;
            println!("Printed successfully!");
        }
        Commands::Encode { job, out } => {
            let (_, raster) = prepare_job(&job)?;
            let packet = encoder::generate(&raster);
            std::fs::write(&out, packet.as_bytes())?;
            println!("Wrote {} bytes to {}", packet.len(), out.display());
        }
        Commands::Preview { job, png } => {
            let (_, raster) = prepare_job(&job)?;
            render::image::save_preview(&raster, &png)?;
            println!("Saved to {}", png.display());
        }
        #[cfg(feature = "ble")]
        Commands::Status { address, profile } => {
            let profile = load_profile(profile.as_ref())?;
            let address = resolve_address(address.as_deref(), &profile)?;
            let link = catprint::transport::BluetoothLink::new(profile.characteristics);
            let mut session = PrinterSession::new(link, address, profile.writer_config()?);
            session.connect().await?;
            let status = session.read_status().await;
            session.disconnect().await?;
            println!("{}", hex(&status?));
        }
    }

    Ok(())
}

fn load_profile(path: Option<&PathBuf>) -> Result<PrinterProfile, CatprintError> {
    match path {
        Some(path) => PrinterProfile::load(path),
        None => Ok(PrinterProfile::standard()),
    }
}

/// Load the profile, apply overrides, and turn the image into a raster.
fn prepare_job(job: &JobArgs) -> Result<(PrinterProfile, Raster), CatprintError> {
    let mut profile = load_profile(job.profile.as_ref())?;
    if let Some(width) = job.width {
        profile.width_dots = width;
    }
    if let Some(max_height) = job.max_height {
        profile.max_height = max_height;
    }
    profile.validate()?;

    let img = render::image::load(&job.image)?;
    let raster = render::image::prepare(
        &img,
        profile.width_dots,
        profile.raster_limits(),
        job.dither,
    )?;
    info!(
        "Prepared {}x{} raster with {} dithering",
        raster.width(),
        raster.height(),
        job.dither
    );
    Ok((profile, raster))
}

fn resolve_address(
    cli: Option<&str>,
    profile: &PrinterProfile,
) -> Result<DeviceAddress, CatprintError> {
    match (cli, &profile.address) {
        (Some(addr), _) => addr.parse(),
        (None, Some(addr)) => Ok(addr.clone()),
        (None, None) => Err(CatprintError::Config(
            "no printer address: pass --address or set it in the profile".to_string(),
        )),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn print(
    profile: &PrinterProfile,
    address: DeviceAddress,
    packet: &Packet,
    dry_run: bool,
    linger: Duration,
) -> Result<(), CatprintError> {
    let writer_config = profile.writer_config()?;

    if dry_run {
        let session = PrinterSession::new(MemoryLink::new(), address, writer_config);
        let link = run_session(session, packet, Duration::ZERO).await?;
        println!(
            "Dry run: {} bytes in {} writes",
            link.received().len(),
            link.attempts().len()
        );
        return Ok(());
    }

    print_ble(profile, address, packet, linger).await
}

#[cfg(feature = "ble")]
async fn print_ble(
    profile: &PrinterProfile,
    address: DeviceAddress,
    packet: &Packet,
    linger: Duration,
) -> Result<(), CatprintError> {
    let link = catprint::transport::BluetoothLink::new(profile.characteristics);
    let session = PrinterSession::new(link, address, profile.writer_config()?);
    run_session(session, packet, linger).await?;
    Ok(())
}

#[cfg(not(feature = "ble"))]
async fn print_ble(
    _profile: &PrinterProfile,
    _address: DeviceAddress,
    _packet: &Packet,
    _linger: Duration,
) -> Result<(), CatprintError> {
    Err(CatprintError::Config(
        "built without Bluetooth support; rebuild with `--features ble` or use --dry-run"
            .to_string(),
    ))
}

/// Connect, send the job, linger for notifications, disconnect.
async fn run_session<L: TransportLink>(
    mut session: PrinterSession<L>,
    packet: &Packet,
    linger: Duration,
) -> Result<L, CatprintError> {
    info!("Connecting to printer {}", session.address());
    session.connect().await?;

    if let Err(e) = session
        .subscribe(Box::new(|payload: Vec<u8>| info!("Notification: {}", hex(&payload))))
        .await
    {
        debug!("Continuing without notifications: {}", e);
    }

    info!("Sending data");
    let result = session.send(packet).await;
    if result.is_ok() && !linger.is_zero() {
        tokio::time::sleep(linger).await;
    }

    session.disconnect().await?;
    result?;
    Ok(session.into_link())
}
