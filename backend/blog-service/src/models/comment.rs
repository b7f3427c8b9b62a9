use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
use validator::Validate;

/// Comment entity - one node of a post's thread, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    /// `None` for a top-level comment
    pub parent_id: Option<Uuid>,
    /// Markdown
    pub content: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub has_been_edited: bool,
    pub created_at: DateTime<Utc>,
    /// Ids of the users who liked this comment
    #[sqlx(skip)]
    pub likes: Vec<Uuid>,
}

impl Comment {
    /// Edit/delete rights: exact match on author identity.
    pub fn is_owned_by(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.author_id)
    }

    pub fn is_liked_by(&self, user_id: Option<Uuid>) -> bool {
        user_id.is_some_and(|id| self.likes.contains(&id))
    }
}

/// A comment with its replies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

/// Assemble flat comments (parent pointers) into a thread forest.
///
/// Input order is preserved at every level. A comment whose parent is not in
/// the list becomes a root. Comments only reachable through a parent cycle
/// are never emitted.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut roots = Vec::new();
    let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();

    for comment in comments {
        match comment.parent_id {
            Some(parent) if ids.contains(&parent) && parent != comment.id => {
                by_parent.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut by_parent))
        .collect()
}

fn attach_children(comment: Comment, by_parent: &mut HashMap<Uuid, Vec<Comment>>) -> CommentNode {
    // remove() hands each child list out once, so no node is visited twice
    let children = by_parent
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_children(child, by_parent))
        .collect();

    CommentNode { comment, children }
}

/// Request body for creating a comment or a reply
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[validate(length(min = 1, max = 10000, message = "Comentário deve conter entre 1 e 10000 caracteres"))]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Request body for editing a comment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentUpdate {
    #[validate(length(min = 1, max = 10000, message = "Comentário deve conter entre 1 e 10000 caracteres"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: u128, parent: Option<u128>) -> Comment {
        Comment {
            id: Uuid::from_u128(id),
            post_id: Uuid::from_u128(999),
            parent_id: parent.map(Uuid::from_u128),
            content: format!("comment {}", id),
            author_id: Uuid::from_u128(500),
            author_name: "ana".to_string(),
            has_been_edited: false,
            created_at: Utc::now(),
            likes: Vec::new(),
        }
    }

    fn shape(nodes: &[CommentNode]) -> Vec<(u128, Vec<u128>)> {
        nodes
            .iter()
            .map(|n| {
                (
                    n.comment.id.as_u128(),
                    n.children.iter().map(|c| c.comment.id.as_u128()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn builds_nested_threads_in_input_order() {
        let tree = build_comment_tree(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(1)),
            comment(5, Some(2)),
        ]);

        assert_eq!(shape(&tree), vec![(1, vec![2, 4]), (3, vec![])]);
        assert_eq!(shape(&tree[0].children), vec![(2, vec![5]), (4, vec![])]);
    }

    #[test]
    fn orphaned_reply_becomes_root() {
        let tree = build_comment_tree(vec![comment(2, Some(77)), comment(3, None)]);
        assert_eq!(shape(&tree), vec![(2, vec![]), (3, vec![])]);
    }

    #[test]
    fn cycle_members_are_dropped() {
        let tree = build_comment_tree(vec![comment(1, Some(2)), comment(2, Some(1)), comment(3, None)]);
        assert_eq!(shape(&tree), vec![(3, vec![])]);
    }

    #[test]
    fn ownership_is_exact_identity() {
        let c = comment(1, None);
        assert!(c.is_owned_by(Some(Uuid::from_u128(500))));
        assert!(!c.is_owned_by(Some(Uuid::from_u128(501))));
        assert!(!c.is_owned_by(None));
    }

    #[test]
    fn tree_serializes_flat_fields_with_children() {
        let tree = build_comment_tree(vec![comment(1, None), comment(2, Some(1))]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["hasBeenEdited"], false);
        assert_eq!(json[0]["children"][0]["parentId"], Uuid::from_u128(1).to_string());
    }
}
