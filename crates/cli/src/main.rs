use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use std::path::PathBuf;

mod handlers;

/// flextk - personal toolkit for cloud storage, auth, payments and media
#[derive(Parser, Debug)]
#[command(name = "flextk")]
#[command(version = "0.1.0")]
#[command(about = "CLI toolkit for GCS, Backblaze B2, S3, Google Drive, Keycloak, Firebase, Stripe and local media tools", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Object storage (GCS, Backblaze B2, AWS S3)
    Cloud {
        #[command(subcommand)]
        provider: CloudProvider,
    },

    /// Google Drive
    Drive {
        #[command(subcommand)]
        action: DriveAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },

    /// Authentication providers (Keycloak, Firebase)
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// Stripe payments
    Pay {
        #[command(subcommand)]
        action: PayAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },

    /// Local media tools (ffmpeg, ImageMagick, LibreOffice)
    Media {
        #[command(subcommand)]
        kind: MediaKind,
    },

    /// Manage the encrypted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },

    /// Diagnostic and verification
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CloudProvider {
    /// Google Cloud Storage
    Gcs {
        #[command(subcommand)]
        action: GcsAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },
    /// Backblaze B2
    Bb2 {
        #[command(subcommand)]
        action: B2Action,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },
    /// AWS S3
    S3 {
        #[command(subcommand)]
        action: S3Action,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum GcsAction {
    /// List files in a bucket folder
    Ls {
        /// Folder path (bucket root when omitted)
        folder: Option<String>,
    },
    /// List immediate subfolders
    Folders { folder: Option<String> },
    /// List the project's buckets
    Buckets,
    /// Upload a local file into a bucket folder
    Upload {
        /// Local file
        file: PathBuf,
        /// Destination folder
        folder: String,
        /// Skip the upload when an identical object already exists
        #[arg(long)]
        skip_existing: bool,
        /// Probe bandwidth and widen the timeout for large files
        #[arg(long)]
        estimate_time: bool,
    },
    /// Download an object
    Download {
        /// Object path in the bucket
        path: String,
        /// Local destination
        dest: PathBuf,
    },
    /// Download many objects in parallel
    DownloadMany {
        /// Object paths in the bucket
        paths: Vec<String>,
        /// Local directory to download into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Maximum parallel downloads
        #[arg(short = 'j', long, default_value = "4")]
        concurrency: usize,
    },
    /// Show object metadata
    Info { path: String },
    /// Delete objects
    Rm { paths: Vec<String> },
    /// Create a folder placeholder
    Mkdir { folder: String },
    /// Copy an object inside the bucket
    Cp { source: String, dest: String },
    /// Move an object inside the bucket
    Mv { source: String, dest: String },
}

#[derive(clap::Subcommand, Debug)]
pub enum B2Action {
    /// List buckets
    Buckets,
    /// Create a bucket
    CreateBucket {
        name: String,
        /// Bucket type: allPublic, allPrivate or snapshot
        #[arg(short = 't', long, default_value = "allPrivate")]
        bucket_type: String,
    },
    /// Delete a bucket
    DeleteBucket { bucket_id: String },
    /// Change a bucket's type
    UpdateBucket {
        bucket_id: String,
        /// Bucket type: allPublic, allPrivate or snapshot
        bucket_type: String,
    },
    /// Upload a local file
    Upload {
        /// Bucket name
        bucket: String,
        /// Local file
        file: PathBuf,
        /// Name in the bucket (defaults to the file's basename)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete one file version
    Rm { file_id: String, file_name: String },
    /// Show file metadata
    Info { file_id: String },
    /// Print the public download URL of a file
    Url {
        bucket: String,
        file_name: String,
        /// Look up by file id instead of name
        #[arg(long)]
        file_id: Option<String>,
    },
    /// Build a time-limited download link for a private bucket
    Link {
        bucket: String,
        file_name: String,
        /// Validity in seconds
        #[arg(short, long, default_value_t = flextk_core::DEFAULT_LINK_VALIDITY_SECS)]
        valid_secs: u64,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum S3Action {
    /// Upload a local file
    Upload {
        file: PathBuf,
        /// Object key (defaults to the file's basename)
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Show object metadata
    Info { key: String },
    /// List objects
    Ls { prefix: Option<String> },
    /// Download an object
    Download { key: String, dest: PathBuf },
    /// Delete an object
    Rm { key: String },
}

#[derive(clap::Subcommand, Debug)]
pub enum DriveAction {
    /// Find folders by name
    Folders { name: String },
    /// Create a folder
    Mkdir {
        name: String,
        /// Parent folder id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Upload a file into a folder
    Upload { folder_id: String, file: PathBuf },
    /// Download a file
    Download { file_id: String, dest: PathBuf },
    /// List the children of a folder
    Ls { folder_id: String },
    /// Delete a file or folder
    Rm { file_id: String },
    /// Share a file
    Share {
        file_id: String,
        /// Grant anyone-with-the-link read access
        #[arg(long)]
        anyone: bool,
        /// Grant a user write access
        #[arg(long)]
        writer: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum AuthProvider {
    /// Keycloak (OpenID Connect)
    Keycloak {
        #[command(subcommand)]
        action: KeycloakAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },
    /// Firebase Auth
    Firebase {
        #[command(subcommand)]
        action: FirebaseAction,
        /// Configuration password (prompted when omitted)
        #[arg(short, long, global = true, env = "FLEXTK_PASSWORD")]
        password: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum KeycloakAction {
    /// Log in with username and password
    Login {
        username: Option<String>,
    },
    /// Refresh a token bundle
    Refresh { refresh_token: String },
    /// Show the userinfo claims of an access token
    Userinfo { access_token: String },
    /// Introspect a token (requires a client secret)
    Introspect { token: String },
    /// Invalidate a session
    Logout { refresh_token: String },
    /// Check whether a token carries a role
    Roles {
        access_token: String,
        role: String,
        /// Check realm roles instead of client roles
        #[arg(long)]
        realm: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum FirebaseAction {
    /// Look up one user
    User {
        /// Firebase uid
        #[arg(long)]
        id: Option<String>,
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// E.164 phone number
        #[arg(long)]
        phone: Option<String>,
    },
    /// List users
    Users {
        /// Page size
        #[arg(short, long, default_value = "100")]
        max_results: u32,
        /// Continue from a page token
        #[arg(long)]
        page_token: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum PayAction {
    /// Create a PaymentIntent
    CreateIntent {
        /// Amount in the currency's smallest unit
        amount: i64,
        #[arg(short, long, default_value = "eur")]
        currency: String,
        /// Payment method types
        #[arg(short, long, default_values_t = vec!["card".to_string()])]
        methods: Vec<String>,
        /// Customer id
        #[arg(long)]
        customer: Option<String>,
        /// Metadata entries as key=value
        #[arg(long)]
        metadata: Vec<String>,
    },
    /// Confirm a PaymentIntent
    Confirm {
        intent_id: String,
        #[arg(long)]
        payment_method: Option<String>,
    },
    /// Show a PaymentIntent
    Get { intent_id: String },
    /// Refund (part of) a PaymentIntent
    Refund {
        payment_intent: String,
        /// Partial amount in cents (full refund when omitted)
        #[arg(short, long)]
        amount: Option<i64>,
        /// Reason: duplicate, fraudulent or requested_by_customer
        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum MediaKind {
    /// Video operations (ffmpeg/ffprobe)
    Video {
        #[command(subcommand)]
        action: VideoAction,
    },
    /// Audio operations (ffmpeg)
    Audio {
        #[command(subcommand)]
        action: AudioAction,
    },
    /// Image operations (ImageMagick)
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },
    /// Document conversion (LibreOffice)
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum VideoAction {
    /// Show duration, dimensions, fps and bit rate
    Probe { video: PathBuf },
    /// Convert between container formats (mp4, avi, mov, mkv, ts)
    Convert { input: PathBuf, output: PathBuf },
    /// Extract frames as PNGs
    Frames {
        video: PathBuf,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Frames per second (native rate when omitted)
        #[arg(long)]
        fps: Option<f64>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum AudioAction {
    /// Convert between audio formats (mp3, wav, flac, ogg, aac)
    Convert { input: PathBuf, output: PathBuf },
    /// Extract the audio track of a video
    Extract { video: PathBuf, output: PathBuf },
}

#[derive(clap::Subcommand, Debug)]
pub enum ImageAction {
    /// Convert to the format named by the output extension
    Convert { input: PathBuf, output: PathBuf },
    /// Resize to exact pixel dimensions
    Resize {
        input: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
    },
    /// Convert to grayscale
    Grayscale { input: PathBuf, output: PathBuf },
    /// Rotate clockwise
    Rotate {
        input: PathBuf,
        output: PathBuf,
        degrees: f64,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum DocAction {
    /// Convert a document (e.g. docx to pdf)
    Convert {
        input: PathBuf,
        /// Target format (pdf, docx, odt, ...)
        format: String,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Set the configuration password (refuses when already set)
    SetPassword,
    /// Replace the password and wipe all stored service configuration
    ResetPassword,
    /// Show which services are configured
    Show,
    /// Store Google Cloud Storage credentials
    Gcs {
        #[arg(long)]
        bucket: Option<String>,
        /// Path to a service-account JSON key
        #[arg(long)]
        service_account: Option<PathBuf>,
    },
    /// Store Backblaze B2 credentials
    Bb2 {
        #[arg(long)]
        app_id: Option<String>,
        #[arg(long)]
        app_key: Option<String>,
    },
    /// Store AWS S3 credentials
    S3 {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Store the Google Drive service account
    Drive {
        #[arg(long)]
        service_account: Option<PathBuf>,
    },
    /// Store the Firebase service account
    Firebase {
        #[arg(long)]
        service_account: Option<PathBuf>,
    },
    /// Store Keycloak settings
    Keycloak {
        #[arg(long)]
        server_url: Option<String>,
        #[arg(long)]
        realm: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Store the Stripe API key
    Stripe {
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Store the Unsplash access key
    Unsplash {
        #[arg(long)]
        access_key: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum DoctorAction {
    /// Check the configuration and probe the media tools
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Parsed command line");

    match cli.command {
        Commands::Cloud { provider } => match provider {
            CloudProvider::Gcs { action, password } => {
                handlers::cloud::handle_gcs(action, password.as_deref()).await
            }
            CloudProvider::Bb2 { action, password } => {
                handlers::cloud::handle_b2(action, password.as_deref()).await
            }
            CloudProvider::S3 { action, password } => {
                handlers::cloud::handle_s3(action, password.as_deref()).await
            }
        },
        Commands::Drive { action, password } => {
            handlers::drive::handle_drive(action, password.as_deref()).await
        }
        Commands::Auth { provider } => match provider {
            AuthProvider::Keycloak { action, password } => {
                handlers::auth::handle_keycloak(action, password.as_deref()).await
            }
            AuthProvider::Firebase { action, password } => {
                handlers::auth::handle_firebase(action, password.as_deref()).await
            }
        },
        Commands::Pay { action, password } => {
            handlers::pay::handle_pay(action, password.as_deref()).await
        }
        Commands::Media { kind } => match kind {
            MediaKind::Video { action } => handlers::media::handle_video(action).await,
            MediaKind::Audio { action } => handlers::media::handle_audio(action).await,
            MediaKind::Image { action } => handlers::media::handle_image(action).await,
            MediaKind::Doc { action } => handlers::media::handle_doc(action).await,
        },
        Commands::Config { action, password } => {
            handlers::config::handle_config(action, password.as_deref()).await
        }
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command())
        }
        Commands::Doctor { action } => match action {
            DoctorAction::Check => handlers::doctor::handle_check().await,
        },
    }
}
