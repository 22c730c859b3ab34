//! Structured-field probe lists, one per entity type (SPEC_FULL.md §4.1.1).

pub const IP_FIELDS: &[&str] = &[
    "src_ip",
    "dst_ip",
    "source_ip",
    "dest_ip",
    "destination_ip",
    "remote_ip",
    "client_ip",
    "server_ip",
    "host_ip",
];

pub const USERNAME_FIELDS: &[&str] = &["username", "user", "login", "account", "user_name", "login_name"];

pub const FILE_PATH_FIELDS: &[&str] = &["file_path", "filename", "file_name", "path", "full_path"];

pub const PROCESS_FIELDS: &[&str] = &["process_name", "process", "image_name", "exe_path", "command_line"];

pub const DEVICE_FIELDS: &[&str] = &["hostname", "device_name", "computer_name", "host_name"];

pub const DOMAIN_FIELDS: &[&str] = &["domain", "domain_name", "dns_query"];

pub const EMAIL_FIELDS: &[&str] = &["email", "email_address", "sender", "recipient"];

pub const URL_FIELDS: &[&str] = &["url", "uri", "request_url"];

pub const HASH_FIELDS: &[&str] = &["md5", "sha1", "sha256", "file_hash", "hash"];

/// System path prefixes used to flag a file entity as a system file
/// (SPEC_FULL.md §4.1.1).
pub const LINUX_SYSTEM_PREFIXES: &[&str] =
    &["/etc", "/usr/bin", "/usr/sbin", "/bin", "/sbin", "/boot", "/sys", "/proc"];

pub const WINDOWS_SYSTEM_PREFIXES: &[&str] =
    &[r"C:\Windows", r"C:\Program Files", r"C:\Program Files (x86)"];
