//! `studbook token`: the report-signing token.

use studbook_config::AppConfig;

pub async fn run(reveal: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let registry = super::registry(&config).await?;
    let token = registry.signing_token().await?;

    let shown = if reveal { token } else { mask(&token) };
    println!("🔑 Signing token: {shown}");
    Ok(())
}

/// Keep the first and last four characters.
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_tokens_keep_their_ends() {
        assert_eq!(mask("abcd1234efgh"), "abcd****efgh");
    }

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
