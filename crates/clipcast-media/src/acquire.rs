//! Source media acquisition using yt-dlp.
//!
//! Video platforms apply traffic shaping and bot detection that varies by
//! client identity, so a single yt-dlp invocation is unreliable. Acquisition
//! runs an ordered list of fallback strategies, each with a different client
//! identity and header set; the first one that exits successfully wins.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::stderr_tail;
use crate::error::{MediaError, MediaResult};

/// Format selector shared by every strategy.
const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// One configured acquisition attempt. Plain data: the strategy list is
/// iterated in order with early exit on success, no per-strategy retry.
#[derive(Debug, Clone)]
pub struct DownloadStrategy {
    /// Short operator-facing name
    pub label: &'static str,
    /// `youtube:player_client=` extractor argument
    pub player_client: Option<&'static str>,
    /// User-Agent header
    pub user_agent: &'static str,
    /// Referer header
    pub referer: Option<&'static str>,
    /// Extra `--add-header` values (`Name:Value`)
    pub extra_headers: &'static [&'static str],
}

impl DownloadStrategy {
    /// Build the yt-dlp argument list for this strategy.
    pub fn build_args(&self, url: &str, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            FORMAT_SELECTOR.to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificate".to_string(),
        ];

        if let Some(client) = self.player_client {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", client));
        }

        args.push("--user-agent".to_string());
        args.push(self.user_agent.to_string());

        if let Some(referer) = self.referer {
            args.push("--referer".to_string());
            args.push(referer.to_string());
        }

        for header in self.extra_headers {
            args.push("--add-header".to_string());
            args.push(header.to_string());
        }

        args.push(url.to_string());
        args
    }
}

/// The production fallback ladder, least-restricted client first.
pub fn default_strategies() -> Vec<DownloadStrategy> {
    vec![
        DownloadStrategy {
            label: "android client",
            player_client: Some("android"),
            user_agent: "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
            referer: Some("https://www.youtube.com/"),
            extra_headers: &["Accept-Language:en-US,en;q=0.9"],
        },
        DownloadStrategy {
            label: "tv embedded client",
            player_client: Some("tv_embedded"),
            user_agent: "Mozilla/5.0 (Linux; Tizen 2.4.0) AppleWebKit/538.1 (KHTML, like Gecko) Version/2.4.0 TV Safari/538.1",
            referer: None,
            extra_headers: &[],
        },
        DownloadStrategy {
            label: "desktop client",
            player_client: None,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
            referer: None,
            extra_headers: &[],
        },
    ]
}

/// Download a video, trying each strategy in order.
///
/// `on_attempt(ordinal, total)` fires before each attempt so the caller can
/// surface which configuration is being tried. Returns on the first
/// successful strategy; when the list is exhausted the last strategy's
/// diagnostic becomes the error.
pub async fn acquire_video<F>(
    url: &str,
    output_path: impl AsRef<Path>,
    strategies: &[DownloadStrategy],
    mut on_attempt: F,
) -> MediaResult<()>
where
    F: FnMut(usize, usize),
{
    let output_path = output_path.as_ref();

    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    if strategies.is_empty() {
        return Err(MediaError::download_failed("No download strategies configured"));
    }

    let total = strategies.len();
    let mut last_error = String::new();

    for (i, strategy) in strategies.iter().enumerate() {
        let ordinal = i + 1;
        on_attempt(ordinal, total);
        info!(
            url = %url,
            strategy = strategy.label,
            "Download attempt {}/{}",
            ordinal,
            total
        );

        let args = strategy.build_args(url, output_path);
        debug!("Running yt-dlp {}", args.join(" "));

        let result = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                if !output_path.exists() {
                    last_error = format!(
                        "Strategy {} ({}) exited cleanly but produced no output file",
                        ordinal, strategy.label
                    );
                    warn!("{}", last_error);
                    continue;
                }
                info!(
                    strategy = strategy.label,
                    output = %output_path.display(),
                    "Download completed"
                );
                return Ok(());
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                last_error = format!(
                    "Strategy {} ({}) failed with exit code {}: {}",
                    ordinal,
                    strategy.label,
                    output
                        .status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    stderr_tail(&stderr)
                );
                warn!("{}", last_error);
            }
            Err(e) => {
                last_error = format!(
                    "Strategy {} ({}) failed to spawn: {}",
                    ordinal, strategy.label, e
                );
                warn!("{}", last_error);
            }
        }
    }

    Err(MediaError::download_failed(format!(
        "All {} download strategies failed; last error: {}",
        total, last_error
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_strategy_order() {
        let strategies = default_strategies();
        assert_eq!(strategies.len(), 3);
        assert_eq!(strategies[0].player_client, Some("android"));
        assert_eq!(strategies[1].player_client, Some("tv_embedded"));
        assert_eq!(strategies[2].player_client, None);
    }

    #[test]
    fn test_strategy_args() {
        let strategy = &default_strategies()[0];
        let args = strategy.build_args(
            "https://youtube.com/watch?v=abc123def45",
            &PathBuf::from("/tmp/out.mp4"),
        );

        assert_eq!(args[0], "-f");
        assert_eq!(args[1], FORMAT_SELECTOR);
        assert!(args.contains(&"--extractor-args".to_string()));
        assert!(args.contains(&"youtube:player_client=android".to_string()));
        assert!(args.contains(&"--referer".to_string()));
        assert!(args.contains(&"Accept-Language:en-US,en;q=0.9".to_string()));
        // URL is always last.
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://youtube.com/watch?v=abc123def45")
        );
    }

    #[test]
    fn test_plain_strategy_omits_extractor_args() {
        let strategy = &default_strategies()[2];
        let args = strategy.build_args("https://example.com/v", &PathBuf::from("o.mp4"));
        assert!(!args.contains(&"--extractor-args".to_string()));
        assert!(!args.contains(&"--referer".to_string()));
    }
}
