use crate::error::{ApiError, ApiResult};
use garde::Validate;
use kino_dal::{Batch, ListingParams};
use serde::Serialize;

#[derive(Debug, Clone, Validate, serde::Deserialize)]
#[garde(allow_unvalidated)]
pub struct Paging {
    #[garde(range(min = 1))]
    pub page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    pub page_size: Option<u32>,
    #[garde(length(max = 255))]
    pub sort: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        // pages are 1-based, 0 from an unvalidated caller must not underflow
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(default_page_size);
        let offset = (page - 1) * page_size;
        let limit = page_size;
        let order = self
            .sort
            .map(|orderings| {
                orderings
                    .split(',')
                    .map(|name| {
                        let (field_name, descending) = match name.trim() {
                            "" => {
                                return Err(ApiError::InvalidQuery(
                                    "Empty ordering name".to_string(),
                                ))
                            }
                            name if name.len() > 100 => {
                                return Err(ApiError::InvalidQuery(
                                    "Ordering name too long".to_string(),
                                ))
                            }
                            name if name.starts_with('+') => (&name[1..], false),
                            name if name.starts_with('-') => (&name[1..], true),
                            name => (name, false),
                        };

                        let order = if descending {
                            kino_dal::Order::Desc(field_name.to_string())
                        } else {
                            kino_dal::Order::Asc(field_name.to_string())
                        };

                        Ok(order)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ListingParams {
            offset: offset.into(),
            limit: limit.into(),
            order,
        })
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }
}

#[derive(Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn try_from_batch(
        batch: Batch<T>,
        page_size: u32,
    ) -> Result<Self, std::num::TryFromIntError> {
        Ok(Self {
            page: u32::try_from(batch.offset)? / page_size + 1,
            page_size,
            total_pages: u32::try_from((batch.total + page_size as u64 - 1) / page_size as u64)?,
            total: batch.total,
            rows: batch.rows,
        })
    }

    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        Self::try_from_batch(batch, page_size).expect("Failed to convert batch to page")
        // As we control the batch, this should never fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_prefixes_parse() {
        let paging = Paging {
            page: Some(2),
            page_size: Some(20),
            sort: Some("-release_date,title".to_string()),
        };
        let params = paging.into_listing_params(100).unwrap();
        assert_eq!(params.offset, 20);
        assert_eq!(params.limit, 20);
        let order = params.order.unwrap();
        assert_eq!(order[0].to_string(), "release_date DESC");
        assert_eq!(order[1].to_string(), "title");
    }

    #[test]
    fn empty_sort_token_is_rejected() {
        let paging = Paging {
            page: None,
            page_size: None,
            sort: Some("title,,id".to_string()),
        };
        assert!(paging.into_listing_params(100).is_err());
    }

    #[test]
    fn page_zero_is_rejected_and_clamped() {
        let paging = Paging {
            page: Some(0),
            page_size: Some(20),
            sort: None,
        };
        assert!(paging.validate().is_err());
        // callers bypassing validation still get a sane offset
        let params = paging.into_listing_params(100).unwrap();
        assert_eq!(params.offset, 0);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn page_envelope_math() {
        let batch = Batch {
            offset: 50,
            total: 101,
            rows: vec![(); 50],
        };
        let page = Page::from_batch(batch, 50);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 101);
    }
}
