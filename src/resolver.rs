use crate::lookup::EntityLookup;
use crate::models::Submission;
use crate::pagination::{Page, PageRequest};
use crate::store::{StoreError, SubmissionQuery, SubmissionStore};

/// Which filters a request carried. Decided once, up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFilter {
    Both { user: String, kind: String },
    UserOnly(String),
    TypeOnly(String),
    Neither,
}

impl SubmissionFilter {
    pub fn from_params(user: Option<String>, kind: Option<String>) -> Self {
        match (user, kind) {
            (Some(user), Some(kind)) => SubmissionFilter::Both { user, kind },
            (Some(user), None) => SubmissionFilter::UserOnly(user),
            (None, Some(kind)) => SubmissionFilter::TypeOnly(kind),
            (None, None) => SubmissionFilter::Neither,
        }
    }

    /// The single filter the search listing honours: `user` wins over `type`,
    /// and no filter at all means nothing to search for.
    pub fn for_search(self) -> Option<Self> {
        match self {
            SubmissionFilter::Both { user, .. } => Some(SubmissionFilter::UserOnly(user)),
            SubmissionFilter::Neither => None,
            single => Some(single),
        }
    }
}

/// Resolve every filter to an id. `None` means some filter did not resolve
/// and the listing is empty. Lookups run user first, and an unknown user
/// stops resolution before the type is looked at.
pub async fn resolve_filter(
    lookup: &EntityLookup,
    filter: &SubmissionFilter,
) -> Result<Option<SubmissionQuery>, StoreError> {
    let query = match filter {
        SubmissionFilter::Both { user, kind } => {
            let Some(user) = lookup.find_user_by_login_pattern(user).await? else {
                return Ok(None);
            };
            let Some(assessment) = lookup.find_assessment_by_type_pattern(kind).await? else {
                return Ok(None);
            };
            SubmissionQuery::ByUserAndAssessment {
                user_id: user.id,
                assessment_id: assessment.id,
            }
        }
        SubmissionFilter::UserOnly(user) => match lookup.find_user_by_login_pattern(user).await? {
            Some(user) => SubmissionQuery::ByUser(user.id),
            None => return Ok(None),
        },
        SubmissionFilter::TypeOnly(kind) => {
            match lookup.find_assessment_by_type_pattern(kind).await? {
                Some(assessment) => SubmissionQuery::ByAssessment(assessment.id),
                None => return Ok(None),
            }
        }
        SubmissionFilter::Neither => SubmissionQuery::All,
    };
    Ok(Some(query))
}

/// Primary listing: no filters lists every submission.
pub async fn resolve_submission_query(
    lookup: &EntityLookup,
    submissions: &dyn SubmissionStore,
    user: Option<String>,
    kind: Option<String>,
    page: &PageRequest,
) -> Result<Page<Submission>, StoreError> {
    let filter = SubmissionFilter::from_params(user, kind);
    fetch(lookup, submissions, &filter, page).await
}

/// Search listing: at most one filter is used and no filter yields an empty page.
pub async fn resolve_submission_search(
    lookup: &EntityLookup,
    submissions: &dyn SubmissionStore,
    user: Option<String>,
    kind: Option<String>,
    page: &PageRequest,
) -> Result<Page<Submission>, StoreError> {
    match SubmissionFilter::from_params(user, kind).for_search() {
        Some(filter) => fetch(lookup, submissions, &filter, page).await,
        None => Ok(Page::empty(page)),
    }
}

async fn fetch(
    lookup: &EntityLookup,
    submissions: &dyn SubmissionStore,
    filter: &SubmissionFilter,
    page: &PageRequest,
) -> Result<Page<Submission>, StoreError> {
    match resolve_filter(lookup, filter).await? {
        Some(query) => {
            tracing::debug!("Listing submissions for {query:?}");
            submissions.find_page(&query, page).await
        }
        None => {
            tracing::debug!("Filter {filter:?} did not resolve, returning an empty page");
            Ok(Page::empty(page))
        }
    }
}
