//! Query ASTs, weights, and scorers.

pub mod boolean;
pub mod constant_score;
pub mod filter;
pub mod match_all;
pub mod multi_term;
pub mod phrase;
pub mod prefix;
#[allow(clippy::module_inception)]
pub mod query;
pub mod range;
pub mod scorer;
pub mod term;
pub mod wildcard;

pub use self::boolean::{combine_queries, BooleanClause, BooleanQuery, Occur};
pub use self::constant_score::{ConstantScoreQuery, FilteredQuery};
pub use self::filter::{Filter, PostFilter, QueryFilter};
pub use self::match_all::MatchAllQuery;
pub use self::multi_term::{BoostedTerm, MultiTermQuery};
pub use self::phrase::{PhraseQuery, PhraseSlot};
pub use self::prefix::PrefixQuery;
pub use self::query::{Query, Weight};
pub use self::range::{RangeQuery, TypedRangeQuery};
pub use self::scorer::Scorer;
pub use self::term::TermQuery;
pub use self::wildcard::{wildcard_match, WildcardQuery};
