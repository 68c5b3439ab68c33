use std::sync::Arc;

use wikitext::html::escape_html;

use crate::error::PageError;
use crate::page::{PageData, PageNode, WikiPage};

/// A page whose content is shown as-is. Its variables are its properties.
pub struct StaticPage {
    node: PageNode,
}

impl StaticPage {
    pub fn root(name: impl Into<String>, data: PageData) -> Arc<Self> {
        Arc::new(StaticPage {
            node: PageNode::new(name.into(), None, data),
        })
    }

    pub fn child_of(parent: &Arc<dyn WikiPage>, name: impl Into<String>, data: PageData) -> Arc<Self> {
        let child = Arc::new(StaticPage {
            node: PageNode::new(name.into(), Some(Arc::downgrade(parent)), data),
        });
        parent.attach_child(child.clone());
        child
    }
}

impl WikiPage for StaticPage {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn parent(&self) -> Option<Arc<dyn WikiPage>> {
        self.node.parent()
    }

    fn is_root(&self) -> bool {
        self.node.is_root()
    }

    fn data(&self) -> PageData {
        self.node.data()
    }

    fn children(&self) -> Vec<Arc<dyn WikiPage>> {
        self.node.children()
    }

    fn attach_child(&self, child: Arc<dyn WikiPage>) {
        self.node.attach_child(child);
    }

    fn html(&self) -> Result<String, PageError> {
        Ok(format!("<pre>{}</pre>\n", escape_html(&self.node.data().content)))
    }

    fn variable(&self, name: &str) -> Result<Option<String>, PageError> {
        Ok(self.node.data().property(name).map(str::to_string))
    }
}
