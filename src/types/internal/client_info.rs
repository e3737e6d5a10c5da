use poem::Request;

/// Client information extracted from an incoming request.
///
/// Browser and operating system strings are derived from the user agent and
/// recorded in audit events and login alerts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
}

impl ClientInfo {
    /// Build ClientInfo from raw IP and user agent values
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        let browser = user_agent.as_deref().map(parse_browser);
        let operating_system = user_agent.as_deref().map(parse_operating_system);
        Self {
            ip_address,
            user_agent,
            browser,
            operating_system,
        }
    }

    /// Extract client information from an HTTP request.
    ///
    /// Checks X-Forwarded-For and X-Real-IP before falling back to the
    /// remote socket address.
    pub fn from_request(req: &Request) -> Self {
        let ip_address = extract_ip_address(req);
        let user_agent = req
            .header("User-Agent")
            .map(|ua| ua.to_string());
        Self::new(ip_address, user_agent)
    }
}

fn extract_ip_address(req: &Request) -> Option<String> {
    if let Some(forwarded) = req.header("X-Forwarded-For") {
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    if let Some(real_ip) = req.header("X-Real-IP") {
        return Some(real_ip.trim().to_string());
    }

    req.remote_addr()
        .as_socket_addr()
        .map(|addr| addr.ip().to_string())
}

/// Best-effort browser family detection. Order matters: Edge and Opera ship
/// a Chrome token, Chrome ships a Safari token.
fn parse_browser(ua: &str) -> String {
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge".to_string()
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera".to_string()
    } else if ua.contains("Chrome/") {
        "Chrome".to_string()
    } else if ua.contains("Firefox/") {
        "Firefox".to_string()
    } else if ua.contains("Safari/") {
        "Safari".to_string()
    } else {
        "Other".to_string()
    }
}

fn parse_operating_system(ua: &str) -> String {
    if ua.contains("Windows") {
        "Windows".to_string()
    } else if ua.contains("Android") {
        "Android".to_string()
    } else if ua.contains("iPhone") || ua.contains("iPad") {
        "iOS".to_string()
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS".to_string()
    } else if ua.contains("Linux") {
        "Linux".to_string()
    } else {
        "Other".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                              AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

    #[test]
    fn detects_chrome_on_windows() {
        let info = ClientInfo::new(Some("10.0.0.1".to_string()), Some(CHROME_WIN.to_string()));
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
        assert_eq!(info.operating_system.as_deref(), Some("Windows"));
    }

    #[test]
    fn detects_firefox_on_linux() {
        let info = ClientInfo::new(None, Some(FIREFOX_LINUX.to_string()));
        assert_eq!(info.browser.as_deref(), Some("Firefox"));
        assert_eq!(info.operating_system.as_deref(), Some("Linux"));
    }

    #[test]
    fn safari_is_not_mistaken_for_chrome() {
        let info = ClientInfo::new(None, Some(SAFARI_MAC.to_string()));
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.operating_system.as_deref(), Some("macOS"));
    }

    #[test]
    fn missing_user_agent_leaves_fields_empty() {
        let info = ClientInfo::new(Some("10.0.0.1".to_string()), None);
        assert!(info.browser.is_none());
        assert!(info.operating_system.is_none());
    }
}
