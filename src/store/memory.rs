use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use crate::models::{Assessment, Submission, User};
use crate::pagination::{Direction, Page, PageRequest};

use super::{AssessmentStore, StoreError, SubmissionQuery, SubmissionStore, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    assessments: RwLock<Vec<Assessment>>,
    submissions: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Anchored, case-insensitive pattern matching `value` literally.
fn literal_ignore_case(value: &str) -> Option<Regex> {
    RegexBuilder::new(&format!("^{}$", regex::escape(value)))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Records the memory store can order by property name.
trait SortByProperty {
    fn id(&self) -> Uuid;
    fn compare_by(&self, other: &Self, property: &str) -> Ordering;
}

impl SortByProperty for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn compare_by(&self, other: &Self, property: &str) -> Ordering {
        match property {
            "login" => self.login.cmp(&other.login),
            "email" => self.email.cmp(&other.email),
            "firstName" => self.first_name.cmp(&other.first_name),
            "lastName" => self.last_name.cmp(&other.last_name),
            "createdDate" => self.created_date.cmp(&other.created_date),
            _ => self.id.cmp(&other.id),
        }
    }
}

impl SortByProperty for Assessment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn compare_by(&self, other: &Self, property: &str) -> Ordering {
        match property {
            "name" => self.name.cmp(&other.name),
            "type" => self.kind.cmp(&other.kind),
            "createdDate" => self.created_date.cmp(&other.created_date),
            _ => self.id.cmp(&other.id),
        }
    }
}

impl SortByProperty for Submission {
    fn id(&self) -> Uuid {
        self.id
    }

    fn compare_by(&self, other: &Self, property: &str) -> Ordering {
        match property {
            "userId" => self.user_id.cmp(&other.user_id),
            "assessmentId" => self.assessment_id.cmp(&other.assessment_id),
            "submittedAt" => self.submitted_at.cmp(&other.submitted_at),
            _ => self.id.cmp(&other.id),
        }
    }
}

/// Sort the filtered set by the request's keys (then id) and cut out one page.
fn paginate<T: SortByProperty>(mut items: Vec<T>, request: &PageRequest) -> Page<T> {
    items.sort_by(|a, b| {
        request
            .sort()
            .iter()
            .map(|sort| {
                let ordering = a.compare_by(b, sort.property);
                match sort.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id().cmp(&b.id()))
    });

    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let size = usize::try_from(request.size()).unwrap_or(usize::MAX);
    let content = items.into_iter().skip(offset).take(size).collect();
    Page::new(content, total, request)
}

/// Replace the record with the same id, or append.
fn upsert<T: SortByProperty + Clone>(items: &mut Vec<T>, record: &T) {
    match items.iter_mut().find(|existing| existing.id() == record.id()) {
        Some(existing) => *existing = record.clone(),
        None => items.push(record.clone()),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login_ignore_case(&self, login: &str) -> Result<Option<User>, StoreError> {
        let Some(pattern) = literal_ignore_case(login) else {
            return Ok(None);
        };
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| pattern.is_match(&u.login)).cloned())
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(pattern) = literal_ignore_case(email) else {
            return Ok(None);
        };
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|u| pattern.is_match(&u.email)).cloned())
    }

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users
            .iter()
            .find(|u| u.activation_key.as_deref() == Some(key))
            .cloned())
    }

    async fn find_unactivated_created_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users
            .iter()
            .filter(|u| !u.activated && u.activation_key.is_some() && u.created_date < before)
            .cloned()
            .collect())
    }

    async fn find_activated_page(&self, page: &PageRequest) -> Result<Page<User>, StoreError> {
        let activated: Vec<User> = {
            let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
            users.iter().filter(|u| u.activated).cloned().collect()
        };
        Ok(paginate(activated, page))
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let login = user.login.to_lowercase();
        let email = user.email.to_lowercase();
        let others = || users.iter().filter(|u| u.id != user.id);
        if others().any(|u| u.login.to_lowercase() == login) {
            return Err(StoreError::Conflict("Login name already used".to_string()));
        }
        if others().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict("Email is already in use".to_string()));
        }
        upsert(&mut users, user);
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        users.retain(|u| u.id != id);
        // Submissions go with their user, as in the schema
        let mut submissions = self.submissions.write().unwrap_or_else(PoisonError::into_inner);
        submissions.retain(|s| s.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
        let assessments = self.assessments.read().unwrap_or_else(PoisonError::into_inner);
        Ok(assessments.iter().find(|a| a.id == id).cloned())
    }

    async fn find_first_by_type_ignore_case(
        &self,
        kind: &str,
    ) -> Result<Option<Assessment>, StoreError> {
        let Some(pattern) = literal_ignore_case(kind) else {
            return Ok(None);
        };
        let assessments = self.assessments.read().unwrap_or_else(PoisonError::into_inner);
        Ok(assessments.iter().find(|a| pattern.is_match(&a.kind)).cloned())
    }

    async fn find_page(
        &self,
        kind: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Assessment>, StoreError> {
        let matching: Vec<Assessment> = {
            let assessments = self.assessments.read().unwrap_or_else(PoisonError::into_inner);
            assessments
                .iter()
                .filter(|a| kind.is_none_or(|kind| a.kind == kind))
                .cloned()
                .collect()
        };
        Ok(paginate(matching, page))
    }

    async fn save(&self, assessment: &Assessment) -> Result<Assessment, StoreError> {
        let mut assessments = self.assessments.write().unwrap_or_else(PoisonError::into_inner);
        upsert(&mut assessments, assessment);
        Ok(assessment.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut assessments = self.assessments.write().unwrap_or_else(PoisonError::into_inner);
        assessments.retain(|a| a.id != id);
        let mut submissions = self.submissions.write().unwrap_or_else(PoisonError::into_inner);
        submissions.retain(|s| s.assessment_id != id);
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let submissions = self.submissions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn find_page(
        &self,
        query: &SubmissionQuery,
        page: &PageRequest,
    ) -> Result<Page<Submission>, StoreError> {
        let matching: Vec<Submission> = {
            let submissions = self.submissions.read().unwrap_or_else(PoisonError::into_inner);
            submissions
                .iter()
                .filter(|s| match *query {
                    SubmissionQuery::All => true,
                    SubmissionQuery::ByUser(user_id) => s.user_id == user_id,
                    SubmissionQuery::ByAssessment(assessment_id) => {
                        s.assessment_id == assessment_id
                    }
                    SubmissionQuery::ByUserAndAssessment {
                        user_id,
                        assessment_id,
                    } => s.user_id == user_id && s.assessment_id == assessment_id,
                })
                .cloned()
                .collect()
        };
        Ok(paginate(matching, page))
    }

    async fn save(&self, submission: &Submission) -> Result<Submission, StoreError> {
        let mut submissions = self.submissions.write().unwrap_or_else(PoisonError::into_inner);
        upsert(&mut submissions, submission);
        Ok(submission.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut submissions = self.submissions.write().unwrap_or_else(PoisonError::into_inner);
        submissions.retain(|s| s.id != id);
        Ok(())
    }
}
