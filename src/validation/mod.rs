/// Domain field validation
///
/// All write paths validate through these rules before touching storage, so a
/// rejected value never produces a partial write. Messages are surfaced
/// verbatim to the caller as InvalidRequest responses.
use crate::error::{SnsError, SnsResult};

/// Region catalog: nationwide, overseas, then the 47 prefectures.
///
/// Posts may carry any one of these values or none. The list is served to
/// clients as-is and enforced on create/edit.
pub const REGIONS: [&str; 49] = [
    "全国",
    "海外",
    "北海道",
    "青森県",
    "岩手県",
    "宮城県",
    "秋田県",
    "山形県",
    "福島県",
    "茨城県",
    "栃木県",
    "群馬県",
    "埼玉県",
    "千葉県",
    "東京都",
    "神奈川県",
    "新潟県",
    "富山県",
    "石川県",
    "福井県",
    "山梨県",
    "長野県",
    "岐阜県",
    "静岡県",
    "愛知県",
    "三重県",
    "滋賀県",
    "京都府",
    "大阪府",
    "兵庫県",
    "奈良県",
    "和歌山県",
    "鳥取県",
    "島根県",
    "岡山県",
    "広島県",
    "山口県",
    "徳島県",
    "香川県",
    "愛媛県",
    "高知県",
    "福岡県",
    "佐賀県",
    "長崎県",
    "熊本県",
    "大分県",
    "宮崎県",
    "鹿児島県",
    "沖縄県",
];

/// Password policy: at least 8 characters, at least one letter, at least one
/// digit. Symbols are permitted.
pub fn validate_password(password: &str) -> SnsResult<()> {
    if password.chars().count() < 8 {
        return Err(SnsError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(SnsError::Validation(
            "Password must contain a letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(SnsError::Validation(
            "Password must contain a digit".to_string(),
        ));
    }

    Ok(())
}

/// Password confirmation must match exactly.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> SnsResult<()> {
    if password != confirmation {
        return Err(SnsError::Validation(
            "Password confirmation does not match".to_string(),
        ));
    }

    Ok(())
}

/// Usernames are 3-20 characters from [a-zA-Z0-9_].
pub fn validate_username(username: &str) -> SnsResult<()> {
    let len = username.chars().count();

    if len < 3 {
        return Err(SnsError::Validation(
            "Username must be at least 3 characters".to_string(),
        ));
    }

    if len > 20 {
        return Err(SnsError::Validation(
            "Username must be at most 20 characters".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SnsError::Validation(
            "Username may only contain letters, digits, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Display names must be non-empty after trimming.
pub fn validate_display_name(display_name: &str) -> SnsResult<()> {
    if display_name.trim().is_empty() {
        return Err(SnsError::Validation(
            "Display name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Bios are capped at 150 characters.
pub fn validate_bio(bio: &str) -> SnsResult<()> {
    if bio.chars().count() > 150 {
        return Err(SnsError::Validation(
            "Bio must be at most 150 characters".to_string(),
        ));
    }

    Ok(())
}

/// Post titles must be non-empty after trimming.
pub fn validate_title(title: &str) -> SnsResult<()> {
    if title.trim().is_empty() {
        return Err(SnsError::Validation("Title cannot be empty".to_string()));
    }

    Ok(())
}

/// External URLs must match ^https?://.+
pub fn validate_post_url(url: &str) -> SnsResult<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(r) if !r.is_empty() => Ok(()),
        _ => Err(SnsError::Validation(
            "URL must start with http:// or https://".to_string(),
        )),
    }
}

/// Regions must come from the catalog.
pub fn validate_region(region: &str) -> SnsResult<()> {
    if REGIONS.contains(&region) {
        Ok(())
    } else {
        Err(SnsError::Validation(format!("Unknown region: {}", region)))
    }
}

/// Normalize a submitted tag list: trim, drop empties, dedup preserving the
/// first occurrence's position.
pub fn normalize_tag_names(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for name in raw {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }

    out
}
