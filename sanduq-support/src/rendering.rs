//! Text rendering for human-friendly resolution errors.
//!
//! Formats resolution chains, trims fully qualified type names and
//! produces "did you mean?" hints for unbound contracts.

/// Renders a resolution chain as a single line.
///
/// # Examples
/// ```
/// use sanduq_support::rendering::render_chain;
///
/// let chain = ["OrderService", "PaymentGateway", "OrderService"];
/// assert_eq!(render_chain(&chain), "OrderService → PaymentGateway → OrderService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut rendered = String::new();
    for (position, link) in chain.iter().enumerate() {
        if position > 0 {
            rendered.push_str(" → ");
        }
        rendered.push_str(link.as_ref());
    }
    rendered
}

/// Strips module paths from a type name, keeping generic structure.
///
/// ```
/// use sanduq_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("shop::billing::Invoice"), "Invoice");
/// assert_eq!(
///     shorten_type_name("sanduq_container::generic::factory::Factory<dyn shop::Mailer>"),
///     "Factory<dyn Mailer>",
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut segment_start = 0;

    for (index, ch) in full_name.char_indices() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            short.push_str(last_path_segment(&full_name[segment_start..index]));
            short.push(ch);
            segment_start = index + ch.len_utf8();
        }
    }
    short.push_str(last_path_segment(&full_name[segment_start..]));
    short
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Picks registered type names that look like the requested one.
///
/// Candidates are ranked by how much of the short name they share with the
/// request; anything sharing less than three leading characters and not
/// containing the request is dropped.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let wanted = comparable(requested);

    let mut ranked: Vec<(usize, &str)> = available
        .iter()
        .filter_map(|&candidate| {
            let short = comparable(candidate);
            if short == wanted {
                return None;
            }
            if short.contains(&wanted) || wanted.contains(&short) {
                return Some((100, candidate));
            }

            let prefix = short
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (prefix >= 3).then_some((prefix * 10, candidate))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.dedup_by(|a, b| a.1 == b.1);
    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

// Contracts and their implementations differ by the `dyn ` prefix only.
fn comparable(type_name: &str) -> String {
    let short = shorten_type_name(type_name).to_lowercase();
    match short.strip_prefix("dyn ") {
        Some(rest) => rest.to_string(),
        None => short,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cycle() {
        assert_eq!(render_chain(&["A", "B", "A"]), "A → B → A");
    }

    #[test]
    fn render_single_link() {
        assert_eq!(render_chain(&["A"]), "A");
    }

    #[test]
    fn render_nothing() {
        let chain: [&str; 0] = [];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_plain_path() {
        assert_eq!(shorten_type_name("app::orders::OrderService"), "OrderService");
    }

    #[test]
    fn shorten_nested_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<sanduq::Many<dyn app::Plugin>>"),
            "Arc<Many<dyn Plugin>>"
        );
    }

    #[test]
    fn shorten_tuple_arguments() {
        assert_eq!(
            shorten_type_name("x::FactoryWith<i32, app::Report>"),
            "FactoryWith<i32, Report>"
        );
    }

    #[test]
    fn shorten_unqualified() {
        assert_eq!(shorten_type_name("u64"), "u64");
    }

    #[test]
    fn suggests_near_misses() {
        let available = [
            "app::OrderService",
            "app::OrderRepository",
            "app::Mailer",
        ];
        let suggestions = suggest_similar("app::OrderServic", &available, 2);
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].contains("OrderService"));
    }

    #[test]
    fn suggests_implementations_for_contracts() {
        let available = ["app::SmtpMailer", "app::Clock"];
        let suggestions = suggest_similar("dyn app::Mailer", &available, 3);
        assert_eq!(suggestions, vec!["app::SmtpMailer".to_string()]);
    }

    #[test]
    fn ignores_exact_match_and_strangers() {
        let available = ["app::Mailer", "app::Clock"];
        assert!(suggest_similar("app::Mailer", &["app::Mailer"], 3).is_empty());
        assert!(suggest_similar("Zebra", &available, 3).is_empty());
    }
}
