use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::edirect::platform::{to_wsl_path, HostPlatform};
use crate::error::{PubMedError, Result};
use crate::medline::parse_medline;
use crate::provider::{SearchOptions, SearchProvider};
use crate::table::ArticleTable;

/// Client for the NCBI Entrez Direct command-line pipeline.
///
/// Runs `esearch -db pubmed -query <q> | efetch -format medline` from a local
/// EDirect installation and parses the output into an [`ArticleTable`]. There
/// is no ceiling on the result count; the tradeoff is requiring the toolkit
/// on disk (see [`EDirectInstaller`](crate::EDirectInstaller)) and a
/// Unix-like host (Windows is supported through WSL).
///
/// # Example
///
/// ```no_run
/// use pubmed_tools::EDirectClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EDirectClient::new("/opt/edirect");
///     let table = client.search("cancer AND 2020[dp]").await?;
///     println!("{} articles", table.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EDirectClient {
    install_dir: PathBuf,
    config: ClientConfig,
}

impl EDirectClient {
    /// Create a client running the EDirect binaries found in `install_dir`
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(install_dir, ClientConfig::new())
    }

    /// Create a client with custom configuration (the API key, when set, is
    /// exported to the pipeline as `NCBI_API_KEY`)
    pub fn with_config(install_dir: impl Into<PathBuf>, config: ClientConfig) -> Self {
        Self {
            install_dir: install_dir.into(),
            config,
        }
    }

    /// Search PubMed through the EDirect pipeline.
    ///
    /// # Errors
    ///
    /// * [`PubMedError::UnsupportedPlatform`] - the host OS cannot run
    ///   EDirect; returned before any subprocess is spawned
    /// * [`PubMedError::EDirectNotInstalled`] - the toolkit is missing from
    ///   the install directory
    /// * [`PubMedError::CommandFailed`] - a pipeline stage exited unsuccessfully
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<ArticleTable> {
        let platform = HostPlatform::detect()?;
        self.search_on(platform, query).await
    }

    async fn search_on(&self, platform: HostPlatform, query: &str) -> Result<ArticleTable> {
        self.ensure_installed()?;

        info!("Downloading data from PubMed via EDirect");
        let medline = match platform {
            HostPlatform::Unix => self.run_unix_pipeline(query).await?,
            HostPlatform::WindowsWsl => self.run_wsl_pipeline(query).await?,
        };

        let records = parse_medline(&medline)?;
        info!(rows = records.len(), "EDirect search completed");
        Ok(ArticleTable::from_records(records))
    }

    fn ensure_installed(&self) -> Result<()> {
        if !self.install_dir.join("esearch").is_file() {
            return Err(PubMedError::EDirectNotInstalled {
                path: self.install_dir.display().to_string(),
            });
        }
        Ok(())
    }

    /// PATH with the install directory prepended, so the EDirect scripts can
    /// find their sibling helpers
    fn path_with_install_dir(&self) -> OsString {
        let mut parts = vec![self.install_dir.clone()];
        if let Some(existing) = std::env::var_os("PATH") {
            parts.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(parts).unwrap_or_else(|_| self.install_dir.clone().into_os_string())
    }

    fn apply_common_env(&self, command: &mut Command, path: &OsString) {
        command.env("PATH", path);
        if let Some(api_key) = &self.config.api_key {
            command.env("NCBI_API_KEY", api_key);
        }
    }

    async fn run_unix_pipeline(&self, query: &str) -> Result<String> {
        let path = self.path_with_install_dir();

        let mut esearch = Command::new(self.install_dir.join("esearch"));
        esearch
            .args(["-db", "pubmed", "-query", query])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_common_env(&mut esearch, &path);

        let mut efetch = Command::new(self.install_dir.join("efetch"));
        efetch.args(["-format", "medline"]);
        self.apply_common_env(&mut efetch, &path);

        run_pipeline(esearch, efetch).await
    }

    async fn run_wsl_pipeline(&self, query: &str) -> Result<String> {
        let wsl_dir = to_wsl_path(&self.install_dir);
        let path = self.path_with_install_dir();

        let mut esearch = Command::new("wsl");
        esearch
            .arg(format!("{wsl_dir}/esearch"))
            .args(["-db", "pubmed", "-query", query])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_common_env(&mut esearch, &path);
        // Forward the API key across the WSL boundary
        if self.config.api_key.is_some() {
            esearch.env("WSLENV", "NCBI_API_KEY");
        }

        let mut efetch = Command::new("wsl");
        efetch
            .arg(format!("{wsl_dir}/efetch"))
            .args(["-format", "medline"]);
        self.apply_common_env(&mut efetch, &path);
        if self.config.api_key.is_some() {
            efetch.env("WSLENV", "NCBI_API_KEY");
        }

        run_pipeline(esearch, efetch).await
    }
}

/// Spawn `first | second` and capture the second stage's stdout
async fn run_pipeline(mut first: Command, mut second: Command) -> Result<String> {
    let first_program = program_name(&first);
    let second_program = program_name(&second);

    debug!(first = %first_program, second = %second_program, "Spawning pipeline");

    let mut first_child = first.spawn().map_err(|e| PubMedError::IoError {
        message: format!("Failed to spawn {first_program}: {e}"),
    })?;

    let first_stdout = first_child
        .stdout
        .take()
        .ok_or_else(|| PubMedError::IoError {
            message: format!("Failed to capture stdout of {first_program}"),
        })?;
    let pipe: Stdio = first_stdout.try_into().map_err(|e| PubMedError::IoError {
        message: format!("Failed to connect pipeline stages: {e}"),
    })?;

    let second_output = second
        .stdin(pipe)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PubMedError::IoError {
            message: format!("Failed to run {second_program}: {e}"),
        })?;

    let first_output = first_child
        .wait_with_output()
        .await
        .map_err(|e| PubMedError::IoError {
            message: format!("Failed to wait for {first_program}: {e}"),
        })?;

    if !first_output.status.success() {
        return Err(command_failed(&first_program, &first_output));
    }
    if !second_output.status.success() {
        return Err(command_failed(&second_program, &second_output));
    }

    Ok(String::from_utf8_lossy(&second_output.stdout).into_owned())
}

fn program_name(command: &Command) -> String {
    command.as_std().get_program().to_string_lossy().into_owned()
}

fn command_failed(program: &str, output: &std::process::Output) -> PubMedError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let message = if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{} ({stderr})", output.status)
    };
    PubMedError::CommandFailed {
        program: program.to_string(),
        message,
    }
}

impl SearchProvider for EDirectClient {
    async fn search_table(&self, query: &str, _options: &SearchOptions) -> Result<ArticleTable> {
        self.search(query).await
    }
}
