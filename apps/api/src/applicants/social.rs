use reqwest::Url;

use crate::models::applicant::SocialLinks;

/// Top-level GitHub paths that are not user names.
const GITHUB_RESERVED: &[&str] = &["orgs", "topics", "features", "settings", "sponsors", "marketplace"];
const LEETCODE_RESERVED: &[&str] = &["problems", "problemset", "contest", "discuss", "explore"];

/// Buckets a resume's extracted links by platform host. Only profile-shaped
/// links (`github.com/<user>`, `leetcode.com/u/<user>`, ...) fill a platform
/// slot, and the first one seen wins. Repository, problem and other deep
/// links land in `other_links` with everything unrecognised.
pub fn classify_links(links: &[String]) -> SocialLinks {
    let mut social = SocialLinks::default();

    for raw in links {
        let link = raw.trim();
        if let Some(address) = strip_scheme(link, "mailto:") {
            social.email.get_or_insert_with(|| address.to_string());
            continue;
        }
        if let Some(number) = strip_scheme(link, "tel:") {
            social.phone.get_or_insert_with(|| number.to_string());
            continue;
        }

        let parsed = Url::parse(link).ok();
        let host = parsed
            .as_ref()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()));
        let segments: Vec<&str> = parsed
            .as_ref()
            .and_then(|u| u.path_segments())
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let slot = match (host.as_deref(), segments.as_slice()) {
            (Some(h), [user]) if matches_host(h, "github.com") && !GITHUB_RESERVED.contains(user) => {
                Some(&mut social.github)
            }
            (Some(h), ["u", _]) if matches_host(h, "leetcode.com") => Some(&mut social.leetcode),
            (Some(h), [user]) if matches_host(h, "leetcode.com") && !LEETCODE_RESERVED.contains(user) => {
                Some(&mut social.leetcode)
            }
            (Some(h), ["profile", _]) if matches_host(h, "codeforces.com") => {
                Some(&mut social.codeforces)
            }
            (Some(h), ["users", _]) if matches_host(h, "codechef.com") => Some(&mut social.codechef),
            (Some(h), ["user", _]) if matches_host(h, "geeksforgeeks.org") => Some(&mut social.gfg),
            (Some(h), ["in", _]) if matches_host(h, "linkedin.com") => Some(&mut social.linkedin),
            _ => None,
        };

        match slot {
            Some(slot) => {
                slot.get_or_insert_with(|| link.to_string());
            }
            None => {
                if !social.other_links.iter().any(|l| l == link) {
                    social.other_links.push(link.to_string());
                }
            }
        }
    }

    social
}

fn strip_scheme<'a>(link: &'a str, scheme: &str) -> Option<&'a str> {
    let head = link.get(..scheme.len())?;
    if head.eq_ignore_ascii_case(scheme) {
        link.get(scheme.len()..)
            .map(|rest| rest.split('?').next().unwrap_or(rest))
            .filter(|rest| !rest.is_empty())
    } else {
        None
    }
}

/// `host` is `domain` itself or one of its subdomains (`in.linkedin.com`).
fn matches_host(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}
