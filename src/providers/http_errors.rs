use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_matches(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn is_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn chat_api_request_error(err: reqwest::Error, api_url: &str) -> anyhow::Error {
    if err.is_timeout() || is_timeout(&err) {
        return anyhow!(
            "Chat completion request timed out while calling '{}'. \
             Check the endpoint's responsiveness.",
            api_url
        );
    }

    if err.is_connect() {
        if is_connection_refused(&err) {
            return anyhow!(
                "Connection refused by the chat completion API at '{}'. \
                 Ensure the endpoint is reachable and OPENAI_BASE_URL is correct.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to the chat completion API at '{}'. \
             Check network connectivity and OPENAI_BASE_URL.",
            api_url
        );
    }

    anyhow!("Failed to call the chat completion API at '{}': {}", api_url, err)
}
