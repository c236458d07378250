//! Prompt construction for the refinement loop.
//!
//! Every function here is pure: the same inputs always produce the same
//! message text. Graphs are embedded through their canonical JSON form.

use bookgraph_core::llm::Message;
use bookgraph_core::{Feedback, KnowledgeGraph};
use serde::{Deserialize, Serialize};

/// System persona shared by all three operations.
pub const SYSTEM_PERSONA: &str =
    "You are an expert in summarizing data into visually appealing knowledge graphs.";

/// Persona for one-shot book summaries outside the refinement loop.
pub const SUMMARY_PERSONA: &str =
    "You are an avid reader and you summarize the books in knowledge graphs and make it entertaining";

/// Default description of what a good graph conveys.
pub const DEFAULT_MEANING: &str = "\
- the resulting graph will be visually appealing and give a good global understanding of the structure of the book it explains.
- The graph will focus on the concepts and relation between the characters and/or the concepts in the book, not tell the story of the book
- Every link description should be of the form close to \"<link_description> represent <reason>\" you are allowed not to follow exactly this pattern though
";

/// Default goal for summarizing `book_title`.
pub fn default_goal(book_title: &str) -> String {
    format!(
        "Generate a graph that will help the reader to understand the structure of the book {book_title}"
    )
}

/// Goal and meaning statements the graph is generated and judged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    /// What the graph is for
    pub goal: String,
    /// What the nodes and links should express
    pub meaning: String,
}

impl Criteria {
    /// Creates criteria from explicit statements.
    pub fn new(goal: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            meaning: meaning.into(),
        }
    }

    /// Default criteria for a book.
    pub fn for_book(book_title: &str) -> Self {
        Self::new(default_goal(book_title), DEFAULT_MEANING)
    }
}

/// The constant system message.
pub fn system_message() -> Message {
    Message::system(SYSTEM_PERSONA)
}

/// Instructions for generating a fresh graph.
pub fn seed_prompt(goal: &str, meaning: &str) -> Message {
    Message::user(format!(
        "
# Goal
{goal}
# Graph meaning
{meaning}
# Graph structure
for the links:
- from_id and to_id are the ids of the nodes from where the link starts and where the link is directed
- Each node represents a concept in the book
- If the graph is too complex to be represented in 2D you are allowed to remove some links and nodes
- If you have a link between two node ids that do not exist you have failed your task
- If there is an isolated node you have failed your task
- The graph should not have isolated components
- A node should not have a self-loop and there should not be a loop between two nodes
- The graph should ideally have 10 nodes and 20 links but be flexible
Take some time and reason step by step before creating the graph object to make a graph that will be easy to display
- You should describe your thought process in the reasoning field of the graph
- Take a deep breath and work through this step by step and make sure you have the right answer
"
    ))
}

/// Request to rate `graph` against the criteria.
pub fn rating_prompt(goal: &str, meaning: &str, graph: &KnowledgeGraph) -> Message {
    Message::user(format!(
        "
Graph json
{graph}

The json above represents a graph that was generated and is supposed to follow the criteria below
<criteria>
# Goal
{goal}
# Graph meaning
{meaning}
</criteria>
Please rate the graph above from 0 to 10 and give feedback on how it can be improved
You should give extra marks to graphs that explain the concepts of the book and help the reader interpret the book as they are reading it
You should penalize graphs with loops between two nodes and give extra marks to graphs with non-standard structures
"
    ))
}

/// Request to improve `graph` given the feedback it received.
pub fn improvement_prompt(
    goal: &str,
    meaning: &str,
    graph: &KnowledgeGraph,
    feedback: &Feedback,
) -> Message {
    let Feedback { rating, opinion } = feedback;
    Message::user(format!(
        "
You made the graph below
```
{graph}
```
Following those instructions
# Goal
{goal}
# Graph meaning
{meaning}
And received the following rating {rating}/10 and this feedback {opinion}. Improve the graph
"
    ))
}

/// Instructions for a one-shot summary of `book_title`.
pub fn summary_prompt(book_title: &str) -> Message {
    Message::user(format!(
        "Summarize the book {book_title} in the graph given as type
Each of the nodes into the graph represent one main concept of the graph
Each of the link represent a link between two main concept
the graph should have 10 nodes and 20 links.
the resulting graph should be visually appealing and give a good global understanding of the book it summarizes.
Take some time and reason step by step before creating the graph object to make a graph that will be easy to display
A node should not have self loop and there should not be a loop between two nodes
The graph should give to the reader a good summary of the book"
    ))
}

/// Full conversation for a one-shot summary.
pub fn summary_messages(book_title: &str) -> Vec<Message> {
    vec![Message::system(SUMMARY_PERSONA), summary_prompt(book_title)]
}

/// Full conversation for a seed generation.
pub fn seed_messages(criteria: &Criteria) -> Vec<Message> {
    vec![
        system_message(),
        seed_prompt(&criteria.goal, &criteria.meaning),
    ]
}

/// Full conversation for rating `graph`.
pub fn rating_messages(criteria: &Criteria, graph: &KnowledgeGraph) -> Vec<Message> {
    vec![
        system_message(),
        rating_prompt(&criteria.goal, &criteria.meaning, graph),
    ]
}

/// Full conversation for improving `graph`.
pub fn improvement_messages(
    criteria: &Criteria,
    graph: &KnowledgeGraph,
    feedback: &Feedback,
) -> Vec<Message> {
    vec![
        system_message(),
        improvement_prompt(&criteria.goal, &criteria.meaning, graph, feedback),
    ]
}
