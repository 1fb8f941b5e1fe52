//! Orderings over RDF terms.
//!
//! [`cmp_terms`] is the total order used to sort validation tuples before merge joins.
//! It follows the SPARQL `ORDER BY` precedence (blank nodes, then IRIs, then literals, then triple terms)
//! and is refined so that two terms compare equal if and only if they are the same term.
//!
//! [`compare_values`] is the partial, value-based order used by the range constraints.

use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef, Term};
use oxsdatatypes::{Boolean, Date, DateTime, Decimal, Double, Time};
use std::cmp::Ordering;
use std::str::FromStr;

/// Total order over terms.
pub fn cmp_terms(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::BlankNode(a), Term::BlankNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::NamedNode(a), Term::NamedNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::Literal(a), Term::Literal(b)) => cmp_literals(a, b),
        #[cfg(feature = "rdf-12")]
        (Term::Triple(a), Term::Triple(b)) => cmp_terms(
            &Term::from(a.subject.clone()),
            &Term::from(b.subject.clone()),
        )
        .then_with(|| a.predicate.as_str().cmp(b.predicate.as_str()))
        .then_with(|| cmp_terms(&a.object, &b.object)),
        _ => term_rank(a).cmp(&term_rank(b)),
    }
}

fn term_rank(term: &Term) -> u8 {
    match term {
        Term::BlankNode(_) => 0,
        Term::NamedNode(_) => 1,
        Term::Literal(_) => 2,
        #[cfg(feature = "rdf-12")]
        Term::Triple(_) => 3,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LiteralFamily {
    Numeric,
    Calendar,
    Other,
}

fn literal_family(datatype: NamedNodeRef<'_>) -> LiteralFamily {
    if is_numeric_datatype(datatype) {
        LiteralFamily::Numeric
    } else if is_calendar_datatype(datatype) {
        LiteralFamily::Calendar
    } else {
        LiteralFamily::Other
    }
}

fn cmp_literals(a: &Literal, b: &Literal) -> Ordering {
    let family_a = literal_family(a.datatype());
    let family_b = literal_family(b.datatype());
    family_a.cmp(&family_b).then_with(|| {
        let by_value = if family_a == LiteralFamily::Numeric {
            match (numeric_value(a), numeric_value(b)) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        } else {
            Ordering::Equal
        };
        by_value
            .then_with(|| a.datatype().as_str().cmp(b.datatype().as_str()))
            .then_with(|| a.language().cmp(&b.language()))
            .then_with(|| a.value().cmp(b.value()))
    })
}

fn numeric_value(literal: &Literal) -> Option<f64> {
    Double::from_str(literal.value()).ok().map(f64::from)
}

pub(crate) fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    datatype == xsd::FLOAT || datatype == xsd::DOUBLE || is_decimal_datatype(datatype)
}

fn is_decimal_datatype(datatype: NamedNodeRef<'_>) -> bool {
    [
        xsd::DECIMAL,
        xsd::INTEGER,
        xsd::LONG,
        xsd::INT,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ]
    .contains(&datatype)
}

fn is_calendar_datatype(datatype: NamedNodeRef<'_>) -> bool {
    [
        xsd::DATE_TIME,
        xsd::DATE_TIME_STAMP,
        xsd::DATE,
        xsd::TIME,
        xsd::G_YEAR,
        xsd::G_YEAR_MONTH,
        xsd::G_MONTH,
        xsd::G_MONTH_DAY,
        xsd::G_DAY,
    ]
    .contains(&datatype)
}

/// Compares two terms by value, the way `sh:minInclusive` and friends do.
///
/// Returns `None` when the values are not comparable, which the range constraints treat as a violation.
pub fn compare_values(a: &Term, b: &Term) -> Option<Ordering> {
    let (Term::Literal(a), Term::Literal(b)) = (a, b) else {
        return None;
    };
    let (dt_a, dt_b) = (a.datatype(), b.datatype());
    if is_numeric_datatype(dt_a) && is_numeric_datatype(dt_b) {
        if is_decimal_datatype(dt_a) && is_decimal_datatype(dt_b) {
            return Decimal::from_str(a.value())
                .ok()?
                .partial_cmp(&Decimal::from_str(b.value()).ok()?);
        }
        return Double::from_str(a.value())
            .ok()?
            .partial_cmp(&Double::from_str(b.value()).ok()?);
    }
    if is_date_time(dt_a) && is_date_time(dt_b) {
        return DateTime::from_str(a.value())
            .ok()?
            .partial_cmp(&DateTime::from_str(b.value()).ok()?);
    }
    if dt_a != dt_b {
        return None;
    }
    if dt_a == xsd::DATE {
        Date::from_str(a.value())
            .ok()?
            .partial_cmp(&Date::from_str(b.value()).ok()?)
    } else if dt_a == xsd::TIME {
        Time::from_str(a.value())
            .ok()?
            .partial_cmp(&Time::from_str(b.value()).ok()?)
    } else if dt_a == xsd::BOOLEAN {
        bool::from(Boolean::from_str(a.value()).ok()?)
            .partial_cmp(&bool::from(Boolean::from_str(b.value()).ok()?))
    } else if dt_a == xsd::STRING {
        Some(a.value().cmp(b.value()))
    } else {
        None
    }
}

fn is_date_time(datatype: NamedNodeRef<'_>) -> bool {
    datatype == xsd::DATE_TIME || datatype == xsd::DATE_TIME_STAMP
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, NamedNode};

    fn int(value: &str) -> Term {
        Literal::new_typed_literal(value, xsd::INTEGER).into()
    }

    #[test]
    fn test_category_order() {
        let bnode: Term = BlankNode::new_unchecked("b").into();
        let iri: Term = NamedNode::new_unchecked("http://example.org/a").into();
        let literal: Term = Literal::new_simple_literal("a").into();
        assert_eq!(cmp_terms(&bnode, &iri), Ordering::Less);
        assert_eq!(cmp_terms(&iri, &literal), Ordering::Less);
        assert_eq!(cmp_terms(&literal, &bnode), Ordering::Greater);
    }

    #[test]
    fn test_numeric_literals_by_value() {
        assert_eq!(cmp_terms(&int("9"), &int("10")), Ordering::Less);
        let decimal: Term = Literal::new_typed_literal("9.5", xsd::DECIMAL).into();
        assert_eq!(cmp_terms(&decimal, &int("10")), Ordering::Less);
        assert_eq!(cmp_terms(&int("9"), &decimal), Ordering::Less);
        // numeric literals come before other literals
        let string: Term = Literal::new_simple_literal("0").into();
        assert_eq!(cmp_terms(&int("100"), &string), Ordering::Less);
    }

    #[test]
    fn test_equal_only_for_identical_terms() {
        assert_eq!(cmp_terms(&int("1"), &int("1")), Ordering::Equal);
        assert_ne!(cmp_terms(&int("1"), &int("01")), Ordering::Equal);
        let double: Term = Literal::new_typed_literal("1", xsd::DOUBLE).into();
        assert_ne!(cmp_terms(&int("1"), &double), Ordering::Equal);
        let en: Term = Literal::new_language_tagged_literal_unchecked("a", "en").into();
        let fr: Term = Literal::new_language_tagged_literal_unchecked("a", "fr").into();
        assert_eq!(cmp_terms(&en, &fr), Ordering::Less);
    }

    #[test]
    fn test_order_is_consistent_when_sorting() {
        let mut terms = vec![
            int("3"),
            Literal::new_simple_literal("b").into(),
            NamedNode::new_unchecked("http://example.org/z").into(),
            BlankNode::new_unchecked("x").into(),
            int("-1"),
            Literal::new_typed_literal("2.5", xsd::DOUBLE).into(),
            Literal::new_typed_literal("2021-01-01", xsd::DATE).into(),
        ];
        terms.sort_by(cmp_terms);
        let again = {
            let mut t = terms.clone();
            t.sort_by(cmp_terms);
            t
        };
        assert_eq!(terms, again);
        assert!(terms[0].is_blank_node());
        assert!(terms[1].is_named_node());
        assert_eq!(terms[2], int("-1"));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&int("2"), &int("10")), Some(Ordering::Less));
        let decimal: Term = Literal::new_typed_literal("2.0", xsd::DECIMAL).into();
        assert_eq!(compare_values(&int("2"), &decimal), Some(Ordering::Equal));
        let date_a: Term = Literal::new_typed_literal("2020-01-01", xsd::DATE).into();
        let date_b: Term = Literal::new_typed_literal("2021-01-01", xsd::DATE).into();
        assert_eq!(compare_values(&date_a, &date_b), Some(Ordering::Less));
        assert_eq!(compare_values(&date_a, &int("1")), None);
        let iri: Term = NamedNode::new_unchecked("http://example.org/a").into();
        assert_eq!(compare_values(&iri, &int("1")), None);
    }
}
