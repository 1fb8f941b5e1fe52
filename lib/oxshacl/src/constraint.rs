//! SHACL constraint components.

use crate::shape::ShapeIndex;
use crate::vocab::sh;
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term};
use regex::Regex;
use std::fmt;

/// A constraint component of a shape, with its parameters.
#[derive(Debug, Clone)]
pub enum ConstraintComponent {
    /// Every value is an instance of the class, following `rdfs:subClassOf` when reasoning is enabled.
    Class(NamedNode),
    Datatype(NamedNode),
    NodeKind(NodeKind),
    MinCount(u64),
    MaxCount(u64),
    MinExclusive(Literal),
    MaxExclusive(Literal),
    MinInclusive(Literal),
    MaxInclusive(Literal),
    MinLength(u64),
    MaxLength(u64),
    /// The regular expression is compiled when the shape is loaded.
    Pattern {
        pattern: String,
        flags: Option<String>,
        regex: Regex,
    },
    /// Language ranges, matched with the basic filtering of RFC 4647.
    LanguageIn(Vec<String>),
    UniqueLang,
    In(Vec<Term>),
    HasValue(Term),
    And(Vec<ShapeIndex>),
    Or(Vec<ShapeIndex>),
    Not(ShapeIndex),
    Xone(Vec<ShapeIndex>),
    Node(ShapeIndex),

    // Parsed only to be rejected at load time
    Closed { ignored_properties: Vec<NamedNode> },
    Disjoint(NamedNode),
    LessThan(NamedNode),
}

impl ConstraintComponent {
    /// The tag identifying the component in reports.
    pub fn source_constraint_component(&self) -> SourceConstraintComponent {
        match self {
            Self::Class(_) => SourceConstraintComponent::Class,
            Self::Datatype(_) => SourceConstraintComponent::Datatype,
            Self::NodeKind(_) => SourceConstraintComponent::NodeKind,
            Self::MinCount(_) => SourceConstraintComponent::MinCount,
            Self::MaxCount(_) => SourceConstraintComponent::MaxCount,
            Self::MinExclusive(_) => SourceConstraintComponent::MinExclusive,
            Self::MaxExclusive(_) => SourceConstraintComponent::MaxExclusive,
            Self::MinInclusive(_) => SourceConstraintComponent::MinInclusive,
            Self::MaxInclusive(_) => SourceConstraintComponent::MaxInclusive,
            Self::MinLength(_) => SourceConstraintComponent::MinLength,
            Self::MaxLength(_) => SourceConstraintComponent::MaxLength,
            Self::Pattern { .. } => SourceConstraintComponent::Pattern,
            Self::LanguageIn(_) => SourceConstraintComponent::LanguageIn,
            Self::UniqueLang => SourceConstraintComponent::UniqueLang,
            Self::In(_) => SourceConstraintComponent::In,
            Self::HasValue(_) => SourceConstraintComponent::HasValue,
            Self::And(_) => SourceConstraintComponent::And,
            Self::Or(_) => SourceConstraintComponent::Or,
            Self::Not(_) => SourceConstraintComponent::Not,
            Self::Xone(_) => SourceConstraintComponent::Xone,
            Self::Node(_) => SourceConstraintComponent::Node,
            Self::Closed { .. } => SourceConstraintComponent::Closed,
            Self::Disjoint(_) => SourceConstraintComponent::Disjoint,
            Self::LessThan(_) => SourceConstraintComponent::LessThan,
        }
    }

    /// The shapes this component refers to.
    pub fn child_shapes(&self) -> &[ShapeIndex] {
        match self {
            Self::And(shapes) | Self::Or(shapes) | Self::Xone(shapes) => shapes,
            Self::Not(shape) | Self::Node(shape) => std::slice::from_ref(shape),
            _ => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::And(_) | Self::Or(_) | Self::Not(_) | Self::Xone(_) | Self::Node(_)
        )
    }

    /// Whether the component can be checked with a single SPARQL query.
    pub fn supports_sparql(&self) -> bool {
        !self.is_composite()
            && !matches!(
                self,
                Self::Closed { .. } | Self::Disjoint(_) | Self::LessThan(_)
            )
    }

    /// The approach that validates the component best.
    ///
    /// `sh:uniqueLang` needs every value of each affected focus node: a grouped query is as cheap
    /// as the transactional plan and is simpler.
    pub fn preferred_approach(&self) -> ValidationApproach {
        match self {
            Self::UniqueLang => ValidationApproach::SparqlBased,
            _ => ValidationApproach::Transactional,
        }
    }
}

/// The constraint component of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceConstraintComponent {
    Class,
    Datatype,
    NodeKind,
    MinCount,
    MaxCount,
    MinExclusive,
    MaxExclusive,
    MinInclusive,
    MaxInclusive,
    MinLength,
    MaxLength,
    Pattern,
    LanguageIn,
    UniqueLang,
    In,
    HasValue,
    And,
    Or,
    Not,
    Xone,
    Node,
    Closed,
    Disjoint,
    LessThan,
}

impl SourceConstraintComponent {
    /// The `sh:...ConstraintComponent` IRI.
    pub fn iri(self) -> NamedNodeRef<'static> {
        NamedNodeRef::new_unchecked(match self {
            Self::Class => "http://www.w3.org/ns/shacl#ClassConstraintComponent",
            Self::Datatype => "http://www.w3.org/ns/shacl#DatatypeConstraintComponent",
            Self::NodeKind => "http://www.w3.org/ns/shacl#NodeKindConstraintComponent",
            Self::MinCount => "http://www.w3.org/ns/shacl#MinCountConstraintComponent",
            Self::MaxCount => "http://www.w3.org/ns/shacl#MaxCountConstraintComponent",
            Self::MinExclusive => "http://www.w3.org/ns/shacl#MinExclusiveConstraintComponent",
            Self::MaxExclusive => "http://www.w3.org/ns/shacl#MaxExclusiveConstraintComponent",
            Self::MinInclusive => "http://www.w3.org/ns/shacl#MinInclusiveConstraintComponent",
            Self::MaxInclusive => "http://www.w3.org/ns/shacl#MaxInclusiveConstraintComponent",
            Self::MinLength => "http://www.w3.org/ns/shacl#MinLengthConstraintComponent",
            Self::MaxLength => "http://www.w3.org/ns/shacl#MaxLengthConstraintComponent",
            Self::Pattern => "http://www.w3.org/ns/shacl#PatternConstraintComponent",
            Self::LanguageIn => "http://www.w3.org/ns/shacl#LanguageInConstraintComponent",
            Self::UniqueLang => "http://www.w3.org/ns/shacl#UniqueLangConstraintComponent",
            Self::In => "http://www.w3.org/ns/shacl#InConstraintComponent",
            Self::HasValue => "http://www.w3.org/ns/shacl#HasValueConstraintComponent",
            Self::And => "http://www.w3.org/ns/shacl#AndConstraintComponent",
            Self::Or => "http://www.w3.org/ns/shacl#OrConstraintComponent",
            Self::Not => "http://www.w3.org/ns/shacl#NotConstraintComponent",
            Self::Xone => "http://www.w3.org/ns/shacl#XoneConstraintComponent",
            Self::Node => "http://www.w3.org/ns/shacl#NodeConstraintComponent",
            Self::Closed => "http://www.w3.org/ns/shacl#ClosedConstraintComponent",
            Self::Disjoint => "http://www.w3.org/ns/shacl#DisjointConstraintComponent",
            Self::LessThan => "http://www.w3.org/ns/shacl#LessThanConstraintComponent",
        })
    }
}

impl fmt::Display for SourceConstraintComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let iri = self.iri().as_str();
        f.write_str(iri.strip_prefix("http://www.w3.org/ns/shacl#").unwrap_or(iri))
    }
}

/// How a constraint is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationApproach {
    /// Only the part of the data touched by the transaction is validated, with a plan.
    Transactional,
    /// The constraint is checked on the whole data with a generated SPARQL query.
    SparqlBased,
}

impl ValidationApproach {
    /// Combines the preferred approaches of several components validated together.
    ///
    /// A SPARQL query can only be used if every component can use one.
    pub fn reduce(approaches: impl IntoIterator<Item = Self>) -> Self {
        if approaches
            .into_iter()
            .all(|approach| approach == Self::SparqlBased)
        {
            Self::SparqlBased
        } else {
            Self::Transactional
        }
    }
}

/// Values of `sh:nodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    BlankNode,
    Iri,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        Some(if iri == sh::BLANK_NODE {
            Self::BlankNode
        } else if iri == sh::IRI {
            Self::Iri
        } else if iri == sh::LITERAL {
            Self::Literal
        } else if iri == sh::BLANK_NODE_OR_IRI {
            Self::BlankNodeOrIri
        } else if iri == sh::BLANK_NODE_OR_LITERAL {
            Self::BlankNodeOrLiteral
        } else if iri == sh::IRI_OR_LITERAL {
            Self::IriOrLiteral
        } else {
            return None;
        })
    }

    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::BlankNode => sh::BLANK_NODE,
            Self::Iri => sh::IRI,
            Self::Literal => sh::LITERAL,
            Self::BlankNodeOrIri => sh::BLANK_NODE_OR_IRI,
            Self::BlankNodeOrLiteral => sh::BLANK_NODE_OR_LITERAL,
            Self::IriOrLiteral => sh::IRI_OR_LITERAL,
        }
    }

    pub fn matches(self, term: &Term) -> bool {
        let (blank, iri, literal) = (
            term.is_blank_node(),
            term.is_named_node(),
            term.is_literal(),
        );
        match self {
            Self::BlankNode => blank,
            Self::Iri => iri,
            Self::Literal => literal,
            Self::BlankNodeOrIri => blank || iri,
            Self::BlankNodeOrLiteral => blank || literal,
            Self::IriOrLiteral => iri || literal,
        }
    }

    /// SPARQL expression checking `?var` has this node kind.
    pub(crate) fn sparql_check(self, var: &str) -> String {
        match self {
            Self::BlankNode => format!("isBlank(?{var})"),
            Self::Iri => format!("isIRI(?{var})"),
            Self::Literal => format!("isLiteral(?{var})"),
            Self::BlankNodeOrIri => format!("(isBlank(?{var}) || isIRI(?{var}))"),
            Self::BlankNodeOrLiteral => format!("(isBlank(?{var}) || isLiteral(?{var}))"),
            Self::IriOrLiteral => format!("(isIRI(?{var}) || isLiteral(?{var}))"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::BlankNode;

    #[test]
    fn test_component_iris() {
        assert_eq!(
            SourceConstraintComponent::MinCount.iri().as_str(),
            "http://www.w3.org/ns/shacl#MinCountConstraintComponent"
        );
        assert_eq!(SourceConstraintComponent::Xone.to_string(), "XoneConstraintComponent");
    }

    #[test]
    fn test_node_kind() {
        let bnode: Term = BlankNode::default().into();
        let literal: Term = Literal::new_simple_literal("a").into();
        assert!(NodeKind::BlankNodeOrLiteral.matches(&bnode));
        assert!(NodeKind::BlankNodeOrLiteral.matches(&literal));
        assert!(!NodeKind::Iri.matches(&literal));
        for kind in [
            NodeKind::BlankNode,
            NodeKind::Iri,
            NodeKind::Literal,
            NodeKind::BlankNodeOrIri,
            NodeKind::BlankNodeOrLiteral,
            NodeKind::IriOrLiteral,
        ] {
            assert_eq!(NodeKind::from_iri(kind.iri()), Some(kind));
        }
    }

    #[test]
    fn test_approach_reduction() {
        use ValidationApproach::*;
        assert_eq!(ValidationApproach::reduce([SparqlBased, SparqlBased]), SparqlBased);
        assert_eq!(ValidationApproach::reduce([SparqlBased, Transactional]), Transactional);
        assert_eq!(
            ConstraintComponent::UniqueLang.preferred_approach(),
            SparqlBased
        );
        assert!(!ConstraintComponent::Node(ShapeIndex::new(0)).supports_sparql());
    }
}
