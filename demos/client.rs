use argh::FromArgs;
use lens_predict::{
    ClientConfig, HealthMonitor, ImageAsset, ImageSource, InferenceClient, InputAcquisitionPort,
    PredictionWorkflow, SubmitOutcome, WorkflowState,
};
use std::{path::PathBuf, sync::Arc, time::Duration};

// defaults for the client
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5000;

#[derive(FromArgs)]
/// Client for classifying images with the inference service
struct ClientArgs {
    /// the host to connect to
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to connect to
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// request timeout in seconds, no timeout when omitted
    #[argh(option, short = 't')]
    timeout: Option<u64>,

    /// command to execute: "predict", "health" or "models"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Predict(PredictCommand),
    Health(HealthCommand),
    Models(ModelsCommand),
}

#[derive(FromArgs)]
/// Classify an image
#[argh(subcommand, name = "predict")]
struct PredictCommand {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// treat the image as a camera capture instead of a gallery pick
    #[argh(switch, short = 'c')]
    camera: bool,
}

#[derive(FromArgs)]
/// Check whether the service is up
#[argh(subcommand, name = "health")]
struct HealthCommand {}

#[derive(FromArgs)]
/// Show which models the service has loaded
#[argh(subcommand, name = "models")]
struct ModelsCommand {}

// picker that hands over a path given on the command line
struct PathPicker(PathBuf);

impl InputAcquisitionPort for PathPicker {
    async fn acquire(&self, source: ImageSource) -> Option<ImageAsset> {
        if !self.0.is_file() {
            log::warn!("{} is not a file", self.0.display());
            return None;
        }
        Some(ImageAsset::new(self.0.to_string_lossy(), source))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClientArgs = argh::from_env();

    let mut config = ClientConfig::new(&format!("http://{}:{}/", args.host, args.port))?;
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(InferenceClient::new(config)?);

    match args.command {
        ClientCommands::Predict(predict_command) => {
            let source = if predict_command.camera {
                ImageSource::Camera
            } else {
                ImageSource::Gallery
            };

            let workflow = PredictionWorkflow::new(client.clone());
            let picker = PathPicker(predict_command.image_path);
            if workflow.acquire(&picker, source).await.is_none() {
                println!("No image selected");
                return Ok(());
            }

            let health = HealthMonitor::new(client);
            let (status, outcome) = tokio::join!(health.check(), workflow.submit());
            println!("Service: {}", status.as_str());

            match outcome? {
                SubmitOutcome::Applied(WorkflowState::Succeeded(asset, result)) => {
                    println!("Image: {}", asset.uri());
                    println!("Predicted class: {}", result.label);
                    println!("Confidence: {:.1}%", result.confidence * 100.0);
                }
                SubmitOutcome::Applied(WorkflowState::Failed(_, error)) => {
                    println!("Prediction failed ({}): {}", error.kind.as_str(), error);
                }
                other => println!("Unexpected outcome: {other:?}"),
            }
        }
        ClientCommands::Health(_) => {
            let monitor = HealthMonitor::start(client).await;
            println!("Service: {}", monitor.status().as_str());
        }
        ClientCommands::Models(_) => {
            let status = client.get_models_status().await?;
            println!("Result: {}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
