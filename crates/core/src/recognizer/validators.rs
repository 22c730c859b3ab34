use super::field_tables::{LINUX_SYSTEM_PREFIXES, WINDOWS_SYSTEM_PREFIXES};
use std::net::IpAddr;

const INVALID_USERNAMES: &[&str] = &["null", "undefined", "anonymous", "guest"];
const SYSTEM_ACCOUNTS: &[&str] = &["system", "administrator", "root", "admin", "service"];

pub fn parse_ip(value: &str) -> Option<IpAddr> {
    value.parse().ok()
}

pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        IpAddr::V6(_) => false,
    }
}

pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    if !(2..=50).contains(&len) {
        return false;
    }
    !INVALID_USERNAMES.contains(&username.to_lowercase().as_str())
}

pub fn is_system_account(username: &str) -> bool {
    SYSTEM_ACCOUNTS.contains(&username.to_lowercase().as_str())
}

pub fn is_valid_file_path(path: &str) -> bool {
    if path.len() < 3 {
        return false;
    }
    path.starts_with('/') || path.as_bytes().get(1..3) == Some(b":\\")
}

pub fn is_system_file(path: &str) -> bool {
    LINUX_SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || WINDOWS_SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub fn file_extension(path: &str) -> Option<String> {
    path.rsplit('.').next().filter(|ext| *ext != path).map(|ext| ext.to_lowercase())
}

pub fn process_name_from(value: &str) -> String {
    value
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(value)
        .to_string()
}

pub fn is_valid_domain(domain: &str) -> bool {
    let len = domain.len();
    if !(4..=255).contains(&len) {
        return false;
    }
    !domain.contains("..") && !domain.starts_with('.') && !domain.ends_with('.')
}

pub fn top_level_domain(domain: &str) -> Option<String> {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() > 1 {
        parts.last().map(|s| s.to_string())
    } else {
        None
    }
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((_, domain)) => domain.contains('.'),
        None => false,
    }
}

pub fn is_valid_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.len() > 10
}

pub fn domain_from_url(url: &str) -> Option<String> {
    let without_scheme = url.splitn(2, "://").nth(1)?;
    let host = without_scheme.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    Md5,
    Sha1,
    Sha256,
}

impl HashType {
    pub fn as_str(self) -> &'static str {
        match self {
            HashType::Md5 => "MD5",
            HashType::Sha1 => "SHA1",
            HashType::Sha256 => "SHA256",
        }
    }
}

pub fn is_valid_hash(value: &str) -> bool {
    matches!(value.len(), 32 | 40 | 64) && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn hash_type_from_length(value: &str) -> Option<HashType> {
    match value.len() {
        32 => Some(HashType::Md5),
        40 => Some(HashType::Sha1),
        64 => Some(HashType::Sha256),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_ip_ranges() {
        assert!(is_private_ip(&parse_ip("10.1.2.3").unwrap()));
        assert!(is_private_ip(&parse_ip("172.16.0.1").unwrap()));
        assert!(is_private_ip(&parse_ip("192.168.1.1").unwrap()));
        assert!(!is_private_ip(&parse_ip("8.8.8.8").unwrap()));
    }

    #[test]
    fn username_rejects_placeholders() {
        assert!(!is_valid_username("guest"));
        assert!(!is_valid_username("a"));
        assert!(is_valid_username("alice"));
    }

    #[test]
    fn file_path_requires_absolute_or_drive_prefix() {
        assert!(is_valid_file_path("/etc/passwd"));
        assert!(is_valid_file_path(r"C:\Windows\System32\cmd.exe"));
        assert!(!is_valid_file_path("relative/path"));
    }

    #[test]
    fn system_file_prefixes_detected() {
        assert!(is_system_file("/usr/bin/sudo"));
        assert!(is_system_file(r"C:\Windows\System32\cmd.exe"));
        assert!(!is_system_file("/home/alice/notes.txt"));
    }

    #[test]
    fn hash_type_derived_from_length() {
        let md5 = "d41d8cd98f00b204e9800998ecf8427e";
        assert!(is_valid_hash(md5));
        assert_eq!(hash_type_from_length(md5), Some(HashType::Md5));
    }

    #[test]
    fn domain_validation() {
        assert!(is_valid_domain("example.com"));
        assert!(!is_valid_domain("a.b"));
        assert!(!is_valid_domain(".example.com"));
        assert!(!is_valid_domain("example..com"));
    }
}
