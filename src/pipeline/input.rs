//! Input resolution: turn a user-supplied path, URL or `-` into Markdown text.
//!
//! Only the CLI uses this stage; HTTP callers send the Markdown in the request
//! body. Inputs are small text documents, so everything is read fully into
//! memory. No temp files are involved.

use crate::error::InputError;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Where the Markdown came from. Used for log lines and the CLI summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Url(String),
    Stdin,
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::File(p) => write!(f, "{}", p.display()),
            InputSource::Url(u) => f.write_str(u),
            InputSource::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Classify the raw CLI argument.
pub fn classify(input: &str) -> InputSource {
    if input == "-" {
        InputSource::Stdin
    } else if is_url(input) {
        InputSource::Url(input.to_string())
    } else {
        InputSource::File(PathBuf::from(input))
    }
}

/// Resolve the input string to Markdown text.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<(InputSource, String), InputError> {
    let source = classify(input);
    let text = match &source {
        InputSource::Stdin => read_stdin().await?,
        InputSource::Url(url) => download_text(url, timeout_secs).await?,
        InputSource::File(path) => read_local(path).await?,
    };
    debug!("Resolved {} ({} bytes)", source, text.len());
    Ok((source, text))
}

async fn read_local(path: &PathBuf) -> Result<String, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => InputError::PermissionDenied { path: path.clone() },
        _ => InputError::FileNotFound { path: path.clone() },
    })?;
    String::from_utf8(bytes).map_err(|_| InputError::NotText { path: path.clone() })
}

async fn read_stdin() -> Result<String, InputError> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(InputError::Stdin)?;
    Ok(text)
}

/// Download a URL and return its body as text.
async fn download_text(url: &str, timeout_secs: u64) -> Result<String, InputError> {
    info!("Downloading Markdown from: {}", url);

    let failed = |reason: String| InputError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let text = response.text().await.map_err(|e| failed(e.to_string()))?;
    info!("Downloaded {} bytes", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/post.md"));
        assert!(is_url("http://example.com/post.md"));
        assert!(!is_url("/tmp/post.md"));
        assert!(!is_url("post.md"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("-"), InputSource::Stdin);
        assert_eq!(
            classify("https://x.io/a.md"),
            InputSource::Url("https://x.io/a.md".into())
        );
        assert_eq!(classify("a.md"), InputSource::File("a.md".into()));
    }

    #[tokio::test]
    async fn test_resolve_local_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "# Title\n\nBody").unwrap();
        let path = f.path().to_str().unwrap().to_string();
        let (source, text) = resolve_input(&path, 5).await.unwrap();
        assert_eq!(source, InputSource::File(path.into()));
        assert_eq!(text, "# Title\n\nBody");
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let err = resolve_input("/definitely/not/here.md", 5).await.unwrap_err();
        assert!(matches!(err, InputError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_binary_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, InputError::NotText { .. }));
    }
}
