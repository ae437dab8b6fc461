//! L1 seed expression parsing
//!
//! HLT paths name their L1 prerequisites as a logical expression. Only plain
//! disjunctions (`A OR B OR C`) can be turned into a prescale, so anything
//! with `AND`, `NOT` or grouping is rejected as a whole.

use crate::types::{L1Seed, SeedExpression, SeedParseError};

/// Parse a seed expression into its list of seeds
///
/// Tokens are separated by whitespace. `OR` is skipped. A token that starts
/// with `(`, ends with `)`, or equals `AND` or `NOT` aborts the parse. For
/// technical expressions every remaining token must be an unsigned bit number.
///
/// # Example
/// ```
/// use prescale_weight::{parse_l1_seeds, L1Seed};
///
/// let seeds = parse_l1_seeds("L1_SingleMu3 OR L1_SingleMu5", false).unwrap();
/// assert_eq!(seeds, vec![
///     L1Seed::Algorithm("L1_SingleMu3".to_string()),
///     L1Seed::Algorithm("L1_SingleMu5".to_string()),
/// ]);
/// ```
pub fn parse_l1_seeds(expression: &str, technical: bool) -> Result<Vec<L1Seed>, SeedParseError> {
    let mut seeds = Vec::new();

    for token in expression.split_whitespace() {
        if token.starts_with('(') || token.ends_with(')') || token == "AND" || token == "NOT" {
            return Err(SeedParseError::Unsupported(token.to_string()));
        }
        if token == "OR" {
            continue;
        }
        if technical {
            let bit = token
                .parse::<u32>()
                .map_err(|_| SeedParseError::InvalidTechnicalBit(token.to_string()))?;
            seeds.push(L1Seed::TechnicalBit(bit));
        } else {
            seeds.push(L1Seed::Algorithm(token.to_string()));
        }
    }

    if seeds.is_empty() {
        return Err(SeedParseError::Empty);
    }
    Ok(seeds)
}

impl SeedExpression {
    /// Parse this expression according to its technical flag
    pub fn parse(&self) -> Result<Vec<L1Seed>, SeedParseError> {
        parse_l1_seeds(&self.expression, self.technical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn algo(name: &str) -> L1Seed {
        L1Seed::Algorithm(name.to_string())
    }

    #[test]
    fn test_single_seed() {
        assert_eq!(parse_l1_seeds("L1_SingleJet36", false), Ok(vec![algo("L1_SingleJet36")]));
    }

    #[test]
    fn test_or_is_skipped() {
        let seeds = parse_l1_seeds("L1_A OR L1_B  OR\tL1_C", false).unwrap();
        assert_eq!(seeds, vec![algo("L1_A"), algo("L1_B"), algo("L1_C")]);
    }

    #[test]
    fn test_unsupported_operators() {
        assert_eq!(
            parse_l1_seeds("L1_A AND L1_B", false),
            Err(SeedParseError::Unsupported("AND".to_string()))
        );
        assert_eq!(
            parse_l1_seeds("NOT L1_A", false),
            Err(SeedParseError::Unsupported("NOT".to_string()))
        );
        assert!(matches!(
            parse_l1_seeds("(L1_A OR L1_B)", false),
            Err(SeedParseError::Unsupported(_))
        ));
        // A closing parenthesis anywhere in the token list aborts too
        assert!(matches!(
            parse_l1_seeds("L1_A OR L1_B)", false),
            Err(SeedParseError::Unsupported(_))
        ));
    }

    #[test]
    fn test_technical_bits() {
        assert_eq!(
            parse_l1_seeds("4 OR 40", true),
            Ok(vec![L1Seed::TechnicalBit(4), L1Seed::TechnicalBit(40)])
        );
        assert_eq!(
            parse_l1_seeds("4 OR L1Tech_BSC", true),
            Err(SeedParseError::InvalidTechnicalBit("L1Tech_BSC".to_string()))
        );
        assert!(matches!(
            parse_l1_seeds("-1", true),
            Err(SeedParseError::InvalidTechnicalBit(_))
        ));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(parse_l1_seeds("", false), Err(SeedParseError::Empty));
        assert_eq!(parse_l1_seeds("   ", true), Err(SeedParseError::Empty));
        assert_eq!(parse_l1_seeds("OR", false), Err(SeedParseError::Empty));
    }

    #[test]
    fn test_seed_expression_parse() {
        let expr = SeedExpression::technical("0 OR 3");
        assert_eq!(
            expr.parse(),
            Ok(vec![L1Seed::TechnicalBit(0), L1Seed::TechnicalBit(3)])
        );
    }
}
