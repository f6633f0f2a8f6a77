/// Split a command into lowercase words: whitespace and pipes separate,
/// quotes are dropped and paths are reduced to their last component.
pub fn tokenize(command: &str) -> Vec<String> {
    command
        .split(|c: char| c.is_whitespace() || c == '|')
        .map(|token| token.trim_matches(|c| c == '"' || c == '\''))
        .map(|token| token.rsplit('/').next().unwrap_or(token))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename_and_quotes() {
        assert_eq!(
            tokenize("/usr/bin/Kitty --class 'float'"),
            vec!["kitty", "--class", "float"]
        );
    }

    #[test]
    fn test_pipes_split_commands() {
        assert_eq!(
            tokenize("grim -g \"$(slurp)\" - |wl-copy"),
            vec!["grim", "-g", "$(slurp)", "-", "wl-copy"]
        );
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("  |  ").is_empty());
        assert!(tokenize("/usr/bin/").is_empty());
    }
}
