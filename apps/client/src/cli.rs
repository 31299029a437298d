use std::path::PathBuf;

use avni_common::{EyeContact, SensoryReaction, SocialResponse, SpeechLevel};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "avni")]
#[command(about = "Developmental screening intake with AI therapy suggestions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Analysis API base URL (overrides AVNI_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding the face model manifests (overrides AVNI_MODELS_DIR)
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    /// Where PDF reports are written (overrides AVNI_REPORT_DIR)
    #[arg(long, global = true)]
    pub report_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill in the form interactively and browse the results (default)
    Screen,

    /// Submit one assessment from flags and print the result
    Analyze {
        #[arg(long)]
        child_name: String,

        #[arg(long)]
        guardian_name: String,

        #[arg(long)]
        age: String,

        /// Good, Moderate or Poor
        #[arg(long)]
        eye_contact: EyeContact,

        /// Normal, Delayed or Non-verbal
        #[arg(long)]
        speech_level: SpeechLevel,

        /// Interactive, Limited or Withdrawn
        #[arg(long)]
        social_response: SocialResponse,

        /// Normal, Sensitive or Extreme
        #[arg(long)]
        sensory_reactions: SensoryReaction,

        /// Photo to run emotion detection on before reporting
        #[arg(long)]
        photo: Option<PathBuf>,

        /// Also write the PDF report
        #[arg(long)]
        export: bool,
    },

    /// Detect the facial expression in a photo
    Emotion {
        /// Image file
        image: PathBuf,
    },
}
