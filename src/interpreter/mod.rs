//! Query interpretation: free-text question to arXiv search expression.

use std::sync::Arc;

use tracing::debug;

use crate::generation::{CompletionProvider, GenerationResult};
use crate::models::SearchExpression;

/// Build the keyword-extraction prompt for a question.
pub fn keyword_prompt(question: &str) -> String {
    format!(
        "Extract 3-5 key search terms from the following research question and format them \
         as an arXiv API search query. Scope every term to all fields with the `all:` prefix, \
         wrap multi-word terms in double quotes, and join the terms with OR, for example:\n\
         all:\"term one\" OR all:\"term two\" OR all:\"term three\"\n\
         Return only the query string, with no explanation.\n\n\
         Question: {question}"
    )
}

/// Turns a question into a [`SearchExpression`] with one completion call.
///
/// The generated text is used verbatim; malformed grammar surfaces later as an
/// empty or irrelevant fetch.
pub struct QueryInterpreter<C>
where
    C: CompletionProvider,
{
    completion: Arc<C>,
}

impl<C> QueryInterpreter<C>
where
    C: CompletionProvider,
{
    pub fn new(completion: Arc<C>) -> Self {
        Self { completion }
    }

    /// Translate the question into a search expression.
    ///
    /// # Errors
    /// Any failure of the completion call is returned unchanged.
    pub async fn interpret(&self, question: &str) -> GenerationResult<SearchExpression> {
        let expression = self.completion.complete(&keyword_prompt(question)).await?;
        debug!(expression = %expression, "interpreted question");
        Ok(SearchExpression::new(expression))
    }
}
