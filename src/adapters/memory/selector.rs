//! The selector subset the captioning page needs: type, `#id`, `.class`
//! and `*` compounds, descendant combinators, and comma-separated lists.
//! Anything else fails to parse and therefore matches nothing.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

/// Compounds joined by descendant combinators, leftmost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Option<Self> {
        let selectors = input
            .split(',')
            .map(ComplexSelector::parse)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { selectors })
    }
}

impl ComplexSelector {
    fn parse(input: &str) -> Option<Self> {
        let compounds = input
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if compounds.is_empty() {
            return None;
        }
        Some(Self { compounds })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut chars = input.chars().peekable();

        match chars.peek() {
            Some('*') => {
                chars.next();
            }
            Some(c) if is_ident_char(*c) => {
                compound.tag = Some(take_ident(&mut chars)?.to_ascii_lowercase());
            }
            _ => {}
        }

        while let Some(prefix) = chars.next() {
            let ident = take_ident(&mut chars)?;
            match prefix {
                '.' => compound.classes.push(ident),
                '#' if compound.id.is_none() => compound.id = Some(ident),
                _ => return None,
            }
        }

        Some(compound)
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    while let Some(c) = chars.peek().copied() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    (!ident.is_empty()).then_some(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_chain() {
        let list = SelectorList::parse("div.page-container.web").unwrap();
        let compound = &list.selectors[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.classes, vec!["page-container", "web"]);
    }

    #[test]
    fn test_parse_descendant_and_list() {
        let list = SelectorList::parse(".page-container.web .subtitle-content, #clean-mode-style").unwrap();
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(list.selectors[0].compounds.len(), 2);
        assert_eq!(list.selectors[1].compounds[0].id.as_deref(), Some("clean-mode-style"));
    }

    #[test]
    fn test_parse_universal() {
        let list = SelectorList::parse("*").unwrap();
        assert_eq!(list.selectors[0].compounds[0], Compound::default());
    }

    #[test]
    fn test_rejects_unsupported_syntax() {
        assert!(SelectorList::parse("").is_none());
        assert!(SelectorList::parse(".a > .b").is_none());
        assert!(SelectorList::parse("a[href]").is_none());
        assert!(SelectorList::parse(".a,").is_none());
        assert!(SelectorList::parse("..a").is_none());
        assert!(SelectorList::parse("#a#b").is_none());
    }
}
