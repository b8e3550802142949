use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Direction::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key. `property` is the JSON name, `column` the store column it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub property: &'static str,
    pub column: &'static str,
    pub direction: Direction,
}

/// Defaults applied while parsing a query string.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 2000,
        }
    }
}

/// A validated page request. Only constructible through [`PageRequest::new`]
/// or [`PageRequest::from_query`], so holding one means the bounds are sane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
    sort: Vec<Sort>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, sort: Vec<Sort>) -> Result<Self, AppError> {
        if page < 0 {
            return Err(AppError::InvalidPageRequest(format!(
                "Page index must not be negative, got {page}"
            )));
        }
        if size < 1 {
            return Err(AppError::InvalidPageRequest(format!(
                "Page size must be at least 1, got {size}"
            )));
        }
        Ok(Self {
            page: page as u64,
            size: size as u64,
            sort,
        })
    }

    /// Parse `page`, `size` and `sort` out of a raw query string. Other
    /// parameters are ignored. Sort properties must appear in `fields`.
    pub fn from_query(
        query: Option<&str>,
        fields: &[(&'static str, &'static str)],
        limits: PageLimits,
    ) -> Result<Self, AppError> {
        let mut page: i64 = 0;
        let mut size = i64::try_from(limits.default_size).unwrap_or(i64::MAX);
        let mut sort = Vec::new();

        for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                "page" => page = parse_number("page", &value)?,
                "size" => size = parse_number("size", &value)?,
                "sort" => sort.extend(parse_sort(&value, fields)?),
                _ => {}
            }
        }

        let max = i64::try_from(limits.max_size).unwrap_or(i64::MAX);
        Self::new(page, size.min(max), sort)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> &[Sort] {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// `(LIMIT, OFFSET)` for SQL binds.
    pub fn limit_offset(&self) -> (i64, i64) {
        (
            i64::try_from(self.size).unwrap_or(i64::MAX),
            i64::try_from(self.offset()).unwrap_or(i64::MAX),
        )
    }

    /// `ORDER BY` clause built from whitelisted columns, with `id` appended as
    /// a tie-breaker so ordering is stable.
    pub fn order_by(&self) -> String {
        let mut keys: Vec<String> = self
            .sort
            .iter()
            .map(|s| format!("{} {}", s.column, s.direction.as_sql()))
            .collect();
        if !self.sort.iter().any(|s| s.column == "id") {
            keys.push("id ASC".to_string());
        }
        format!("ORDER BY {}", keys.join(", "))
    }
}

fn parse_number(name: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidPageRequest(format!("Invalid {name} parameter '{value}'")))
}

/// `a,b,desc` sorts both `a` and `b` descending; the direction defaults to asc.
fn parse_sort(
    value: &str,
    fields: &[(&'static str, &'static str)],
) -> Result<Vec<Sort>, AppError> {
    let mut parts: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let direction = match parts.last().and_then(|last| Direction::parse(last)) {
        Some(direction) => {
            parts.pop();
            direction
        }
        None => Direction::Asc,
    };

    parts
        .into_iter()
        .map(|property| {
            fields
                .iter()
                .find(|(name, _)| *name == property)
                .map(|&(name, column)| Sort {
                    property: name,
                    column,
                    direction,
                })
                .ok_or_else(|| {
                    AppError::InvalidPageRequest(format!("Unknown sort property '{property}'"))
                })
        })
        .collect()
}

/// One page of a result set plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            content,
            total,
            page: request.page(),
            size: request.size(),
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            1
        } else {
            self.total.div_ceil(self.size)
        }
    }
}
