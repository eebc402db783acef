//! WebSocket origin policy.

/// Settings for `GET /subscribe/{campaign_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Host patterns browsers may connect from, e.g. `*.example.org`.
    /// `*` matches any run of characters; matching ignores ASCII case.
    pub allowed_origins: Vec<String>,
}

impl SubscriberConfig {
    /// Whether a cross-origin host (with port, if any) is allowed.
    ///
    /// Requests without an `Origin` or from the server's own host never
    /// reach this check.
    pub fn allows_origin_host(&self, origin_host: &str) -> bool {
        let origin_host = origin_host.to_ascii_lowercase();
        self.allowed_origins
            .iter()
            .any(|pattern| glob_match(&pattern.to_ascii_lowercase(), &origin_host))
    }
}

/// Match `text` against a pattern where `*` stands for any run of bytes.
fn glob_match(pattern: &str, text: &str) -> bool {
    let (pattern, text) = (pattern.as_bytes(), text.as_bytes());
    let (mut p, mut t) = (0, 0);
    // Position after the last `*` seen, and the text index it resumed from.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                p += 1;
                backtrack = Some((p, t));
            }
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}
