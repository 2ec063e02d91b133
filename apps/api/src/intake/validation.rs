//! Signup form validation.
//!
//! `validate` is a pure function: it takes the collected form fields and the
//! configured upload policy and either returns the sanitized values ready for
//! persistence or every per-field failure at once. Nothing here touches the
//! network, the database, or the filesystem.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use validator::ValidateEmail;

pub const INVALID_VALUE: &str = "Invalid value";
pub const RESUME_REQUIRED: &str = "Resume file is required";
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";
pub const MALFORMED_BODY: &str = "Malformed multipart body";

/// Raw fields as they arrived in the multipart body. `None` means the part was absent.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: Option<String>,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub resume: Option<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub contents: Bytes,
}

/// Form values after trimming, escaping, and email normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignup {
    pub name: String,
    pub phone_no: String,
    pub email: String,
    pub resume: UploadedFile,
}

/// One failed field, serialized into the `errors` array of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: &'static str,
    pub path: &'static str,
    pub location: &'static str,
}

impl FieldError {
    pub fn new(path: &'static str, value: &str, msg: &'static str) -> Self {
        FieldError {
            kind: "field",
            value: value.to_string(),
            msg,
            path,
            location: "body",
        }
    }

    pub fn invalid(path: &'static str, value: &str) -> Self {
        Self::new(path, value, INVALID_VALUE)
    }
}

/// Which résumé file extensions are accepted. An empty list accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list such as `"pdf, .docx,DOC"`.
    pub fn from_list(raw: &str) -> Self {
        let mut allowed_extensions: Vec<String> = raw
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        allowed_extensions.sort();
        allowed_extensions.dedup();
        UploadPolicy { allowed_extensions }
    }

    pub fn allows(&self, file_name: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }
}

/// Validates every field independently and collects all failures.
pub fn validate(
    form: &SignupForm,
    policy: &UploadPolicy,
) -> Result<ValidatedSignup, Vec<FieldError>> {
    let name = required_text("name", form.name.as_deref());
    let phone_no = required_text("phoneNo", form.phone_no.as_deref());
    let email = valid_email(form.email.as_deref());
    let resume = resume_file(form.resume.as_ref(), policy);

    match (name, phone_no, email, resume) {
        (Ok(name), Ok(phone_no), Ok(email), Ok(resume)) => Ok(ValidatedSignup {
            name,
            phone_no,
            email,
            resume,
        }),
        (name, phone_no, email, resume) => Err([
            name.err(),
            phone_no.err(),
            email.err(),
            resume.err(),
        ]
        .into_iter()
        .flatten()
        .collect()),
    }
}

fn required_text(path: &'static str, raw: Option<&str>) -> Result<String, FieldError> {
    let raw = raw.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::invalid(path, raw));
    }
    Ok(escape_html(trimmed))
}

fn valid_email(raw: Option<&str>) -> Result<String, FieldError> {
    let raw = raw.unwrap_or_default();
    normalize_email(raw).ok_or_else(|| FieldError::invalid("email", raw))
}

fn resume_file(
    file: Option<&UploadedFile>,
    policy: &UploadPolicy,
) -> Result<UploadedFile, FieldError> {
    let file = file.ok_or_else(|| FieldError::new("resume", "", RESUME_REQUIRED))?;
    if !policy.allows(&file.file_name) {
        return Err(FieldError::new(
            "resume",
            &file.file_name,
            FILE_TYPE_NOT_ALLOWED,
        ));
    }
    Ok(file.clone())
}

/// Replaces HTML-significant characters with entities.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];
const PLUS_SUBADDRESS_DOMAINS: &[&str] = &[
    "hotmail.at",
    "hotmail.be",
    "hotmail.ca",
    "hotmail.cl",
    "hotmail.co.il",
    "hotmail.co.nz",
    "hotmail.co.th",
    "hotmail.co.uk",
    "hotmail.com",
    "hotmail.com.ar",
    "hotmail.com.au",
    "hotmail.com.br",
    "hotmail.com.gr",
    "hotmail.com.mx",
    "hotmail.com.pe",
    "hotmail.com.tr",
    "hotmail.com.vn",
    "hotmail.cz",
    "hotmail.de",
    "hotmail.dk",
    "hotmail.es",
    "hotmail.fr",
    "hotmail.hu",
    "hotmail.id",
    "hotmail.ie",
    "hotmail.in",
    "hotmail.it",
    "hotmail.jp",
    "hotmail.kr",
    "hotmail.lv",
    "hotmail.my",
    "hotmail.ph",
    "hotmail.pt",
    "hotmail.sa",
    "hotmail.sg",
    "hotmail.sk",
    "live.be",
    "live.co.uk",
    "live.com",
    "live.com.ar",
    "live.com.mx",
    "live.de",
    "live.es",
    "live.eu",
    "live.fr",
    "live.it",
    "live.nl",
    "msn.com",
    "outlook.at",
    "outlook.be",
    "outlook.cl",
    "outlook.co.il",
    "outlook.co.nz",
    "outlook.co.th",
    "outlook.com",
    "outlook.com.ar",
    "outlook.com.au",
    "outlook.com.br",
    "outlook.com.gr",
    "outlook.com.pe",
    "outlook.com.tr",
    "outlook.com.vn",
    "outlook.cz",
    "outlook.de",
    "outlook.dk",
    "outlook.es",
    "outlook.fr",
    "outlook.hu",
    "outlook.id",
    "outlook.ie",
    "outlook.in",
    "outlook.it",
    "outlook.jp",
    "outlook.kr",
    "outlook.lv",
    "outlook.my",
    "outlook.ph",
    "outlook.pt",
    "outlook.sa",
    "outlook.sg",
    "outlook.sk",
    "passport.com",
    "icloud.com",
    "me.com",
];
const DASH_SUBADDRESS_DOMAINS: &[&str] = &[
    "rocketmail.com",
    "yahoo.ca",
    "yahoo.co.uk",
    "yahoo.com",
    "yahoo.de",
    "yahoo.fr",
    "yahoo.in",
    "yahoo.it",
    "ymail.com",
];

/// Returns the canonical form of a syntactically valid address, or `None`.
///
/// The whole address is trimmed and lower-cased. Gmail addresses also lose
/// dots and `+tags` in the local part and `googlemail.com` becomes
/// `gmail.com`. Outlook/Hotmail/Live, iCloud and Yahoo domains in the lists
/// above drop their sub-address suffix; other domains are left as they are.
///
/// On top of `ValidateEmail`, the domain needs an alphabetic TLD, IP
/// literals are refused, and the local part must be a plain dot-atom.
pub fn normalize_email(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    if !lowered.validate_email() {
        return None;
    }

    let (local, domain) = lowered.rsplit_once('@')?;
    if !is_dot_atom(local) || !has_alphabetic_tld(domain) {
        return None;
    }

    let (local, domain) = if GMAIL_DOMAINS.contains(&domain) {
        let base = local.split('+').next().unwrap_or_default();
        (base.replace('.', ""), "gmail.com")
    } else if PLUS_SUBADDRESS_DOMAINS.contains(&domain) {
        (local.split('+').next().unwrap_or_default().to_string(), domain)
    } else if DASH_SUBADDRESS_DOMAINS.contains(&domain) {
        (local.split('-').next().unwrap_or_default().to_string(), domain)
    } else {
        (local.to_string(), domain)
    };

    if local.is_empty() {
        return None;
    }
    Some(format!("{local}@{domain}"))
}

fn is_dot_atom(local: &str) -> bool {
    !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

fn has_alphabetic_tld(domain: &str) -> bool {
    if domain.starts_with('[') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
