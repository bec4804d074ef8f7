//! Answer synthesis from retrieved papers.
//!
//! Two mutually exclusive paths:
//!
//! - **grounded**: the prompt lists every retrieved match, in the order the
//!   searcher returned them, followed by a fixed instruction block;
//! - **fallback**: used when the corpus returned nothing or the search found no
//!   usable match ([`FallbackReason`]); the model answers from general
//!   knowledge and says so.
//!
//! Generated text is returned verbatim. Rendering it safely (it is usually
//! markdown) is the caller's job.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::generation::{CompletionProvider, GenerationResult};
use crate::models::{Answer, RetrievedMatch};

const GROUNDED_INSTRUCTIONS: &str = "\
Using the papers above, write a comprehensive answer to the question. In your answer:
1. Synthesize the findings across multiple sources instead of summarizing each paper in turn.
2. Point out where the papers agree and where they disagree.
3. Note gaps or limitations in the current research.
4. Suggest directions for further research.

Do not refer to any paper by its title.
Do not restate the question; begin directly with the answer.";

/// Build the grounded-synthesis prompt, listing matches in the given order.
pub fn grounded_prompt(question: &str, matches: &[RetrievedMatch]) -> String {
    let mut prompt = format!("Question: {question}\n\nRelevant research papers:\n");

    for (i, m) in matches.iter().enumerate() {
        let meta = &m.metadata;
        // Writing into a String cannot fail.
        let _ = write!(
            prompt,
            "\nPaper {}:\nTitle: {}\nAuthors: {}\nCategories: {}\n\
             Published: {}\nRelevance Score: {:.4}\nAbstract: {}\n",
            i + 1,
            meta.title,
            meta.authors.join(", "),
            meta.categories.join(", "),
            meta.published,
            m.score,
            meta.summary,
        );
    }

    prompt.push('\n');
    prompt.push_str(GROUNDED_INSTRUCTIONS);
    prompt
}

/// Why the run is answering without sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The corpus returned no papers for the search expression
    NothingFetched,

    /// Papers were fetched and indexed, but the search returned no usable match
    NothingRetrieved,
}

/// Build the fallback prompt used when there are no sources to ground on.
pub fn fallback_prompt(question: &str, reason: FallbackReason) -> String {
    let opening = match reason {
        FallbackReason::NothingFetched => {
            "No papers matching the following research question were found in the paper corpus."
        }
        FallbackReason::NothingRetrieved => {
            "Papers were retrieved for the following research question, but none of them \
             could be matched to it."
        }
    };

    format!(
        "{opening}\n\n\
         Question: {question}\n\n\
         Answer the question from your general knowledge. State clearly at the start \
         that no matching papers were found, and finish by suggesting related topics \
         or search terms the user could explore instead."
    )
}

/// Produces the final answer with one completion call.
pub struct AnswerSynthesizer<C>
where
    C: CompletionProvider,
{
    completion: Arc<C>,
}

impl<C> AnswerSynthesizer<C>
where
    C: CompletionProvider,
{
    pub fn new(completion: Arc<C>) -> Self {
        Self { completion }
    }

    /// Answer the question grounded in the retrieved matches.
    ///
    /// # Errors
    /// Any failure of the completion call is returned unchanged.
    pub async fn synthesize_grounded(
        &self,
        question: &str,
        matches: &[RetrievedMatch],
    ) -> GenerationResult<Answer> {
        debug!(sources = matches.len(), "synthesizing grounded answer");
        let text = self
            .completion
            .complete(&grounded_prompt(question, matches))
            .await?;
        Ok(Answer::grounded(text))
    }

    /// Answer the question without sources; tagged as a no-results answer.
    ///
    /// # Arguments
    /// * `question` - The user's question
    /// * `reason` - Whether nothing was fetched or nothing could be retrieved
    ///
    /// # Errors
    /// Any failure of the completion call is returned unchanged.
    pub async fn synthesize_fallback(
        &self,
        question: &str,
        reason: FallbackReason,
    ) -> GenerationResult<Answer> {
        debug!(?reason, "synthesizing fallback answer");
        let text = self
            .completion
            .complete(&fallback_prompt(question, reason))
            .await?;
        Ok(Answer::no_results(text))
    }
}
