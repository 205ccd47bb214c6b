//! Structural graph of members and weld joints.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::input::{Joint, Member, ProjectInput};

/// Node payload: a borrowed member or joint of the project input.
#[derive(Clone, Copy, Debug)]
enum Element<'a> {
    /// Structural plate.
    Member(&'a Member),
    /// Weld connection.
    Joint(&'a Joint),
}

/// Edge payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    /// Joint to member; `position` is the index in `connected_members`.
    Connects {
        /// Position in the joint's member list.
        position: usize,
    },
    /// Joint to joint; `position` is the index in `related_joint_ids`.
    Related {
        /// Position in the joint's related list.
        position: usize,
    },
}

/// A joint reference that names no member or joint of the project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnresolvedReference {
    /// `connected_members` names an unknown member.
    Member {
        /// Joint holding the reference.
        joint_id: String,
        /// Unknown member id.
        member_id: String,
    },
    /// `related_joint_ids` names an unknown joint.
    Joint {
        /// Joint holding the reference.
        joint_id: String,
        /// Unknown joint id.
        related_id: String,
    },
}

/// Members and joints of one project, linked the way the drawing connects them.
///
/// Members are added first and joints after, both in input order, so node
/// indices give a stable iteration order independent of any hashing.
#[derive(Debug)]
pub struct StructuralGraph<'a> {
    /// Underlying graph storage.
    graph: DiGraph<Element<'a>, Link>,
    /// Member nodes in input order.
    members: Vec<NodeIndex>,
    /// Joint nodes in input order.
    joints: Vec<NodeIndex>,
    /// Lookup from member id to node; the first occurrence wins.
    member_index: HashMap<&'a str, NodeIndex>,
    /// Lookup from joint id to node; the first occurrence wins.
    joint_index: HashMap<&'a str, NodeIndex>,
    /// References that could not be linked.
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> StructuralGraph<'a> {
    /// Build the graph for a project.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{Joint, JointType, Member, MemberRole, ProjectInput, StructuralGraph, Zone};
    ///
    /// let mut project = ProjectInput::default();
    /// project.members.push(Member::new("M01", MemberRole::UpperDeckPlate, Zone::CargoHoldRegion));
    /// project.joints.push(Joint::new("J01", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M01", "M99"]));
    ///
    /// let graph = StructuralGraph::build(&project);
    /// assert_eq!(graph.member_count(), 1);
    /// assert_eq!(graph.connected_members(&project.joints[0]).len(), 1);
    /// assert_eq!(graph.unresolved().len(), 1);
    /// ```
    #[must_use]
    pub fn build(project: &'a ProjectInput) -> Self {
        let mut graph = DiGraph::new();
        let mut members = Vec::with_capacity(project.members.len());
        let mut member_index = HashMap::new();
        for member in &project.members {
            let node = graph.add_node(Element::Member(member));
            members.push(node);
            member_index.entry(member.member_id.as_str()).or_insert(node);
        }

        let mut joints = Vec::with_capacity(project.joints.len());
        let mut joint_index = HashMap::new();
        for joint in &project.joints {
            let node = graph.add_node(Element::Joint(joint));
            joints.push(node);
            joint_index.entry(joint.joint_id.as_str()).or_insert(node);
        }

        let mut unresolved = Vec::new();
        for (joint, &node) in project.joints.iter().zip(&joints) {
            for (position, member_id) in joint.connected_members.iter().enumerate() {
                match member_index.get(member_id.as_str()) {
                    Some(&target) => {
                        graph.add_edge(node, target, Link::Connects { position });
                    }
                    None => unresolved.push(UnresolvedReference::Member {
                        joint_id: joint.joint_id.clone(),
                        member_id: member_id.clone(),
                    }),
                }
            }
            for (position, related_id) in joint.related_joint_ids.iter().enumerate() {
                match joint_index.get(related_id.as_str()) {
                    Some(&target) => {
                        graph.add_edge(node, target, Link::Related { position });
                    }
                    None => unresolved.push(UnresolvedReference::Joint {
                        joint_id: joint.joint_id.clone(),
                        related_id: related_id.clone(),
                    }),
                }
            }
        }

        Self {
            graph,
            members,
            joints,
            member_index,
            joint_index,
            unresolved,
        }
    }

    /// Return the number of members in the graph.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Return the number of joints in the graph.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Return the number of member and related-joint links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Members in input order.
    pub fn members(&self) -> impl Iterator<Item = &'a Member> + '_ {
        self.members.iter().filter_map(|&node| self.member_at(node))
    }

    /// Joints in input order.
    pub fn joints(&self) -> impl Iterator<Item = &'a Joint> + '_ {
        self.joints.iter().filter_map(|&node| self.joint_at(node))
    }

    /// Members welded by `joint`, in the order the joint lists them.
    ///
    /// Ids that do not resolve to a member are skipped.
    #[must_use]
    pub fn connected_members(&self, joint: &Joint) -> Vec<&'a Member> {
        let Some(&node) = self.joint_index.get(joint.joint_id.as_str()) else {
            return Vec::new();
        };
        let mut linked: Vec<(usize, NodeIndex)> = self
            .outgoing(node)
            .filter_map(|(link, target)| match link {
                Link::Connects { position } => Some((position, target)),
                Link::Related { .. } => None,
            })
            .collect();
        linked.sort_unstable_by_key(|&(position, _)| position);
        linked
            .into_iter()
            .filter_map(|(_, target)| self.member_at(target))
            .collect()
    }

    /// Joints listed in `related_joint_ids` of `joint` that exist in the project.
    #[must_use]
    pub fn related_joints(&self, joint: &Joint) -> Vec<&'a Joint> {
        let Some(&node) = self.joint_index.get(joint.joint_id.as_str()) else {
            return Vec::new();
        };
        let mut linked: Vec<(usize, NodeIndex)> = self
            .outgoing(node)
            .filter_map(|(link, target)| match link {
                Link::Related { position } => Some((position, target)),
                Link::Connects { .. } => None,
            })
            .collect();
        linked.sort_unstable_by_key(|&(position, _)| position);
        linked
            .into_iter()
            .filter_map(|(_, target)| self.joint_at(target))
            .collect()
    }

    /// Joints welding `member`, in input order.
    #[must_use]
    pub fn joints_of_member(&self, member: &Member) -> Vec<&'a Joint> {
        let Some(&node) = self.member_index.get(member.member_id.as_str()) else {
            return Vec::new();
        };
        let mut sources: Vec<NodeIndex> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|edge| matches!(edge.weight(), Link::Connects { .. }))
            .map(|edge| edge.source())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
            .into_iter()
            .filter_map(|source| self.joint_at(source))
            .collect()
    }

    /// References that named no member or joint, in input order.
    #[must_use]
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Outgoing links of a node with their targets.
    fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = (Link, NodeIndex)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
    }

    /// Member stored at `node`, if the node holds one.
    fn member_at(&self, node: NodeIndex) -> Option<&'a Member> {
        match self.graph.node_weight(node) {
            Some(Element::Member(member)) => Some(*member),
            _ => None,
        }
    }

    /// Joint stored at `node`, if the node holds one.
    fn joint_at(&self, node: NodeIndex) -> Option<&'a Joint> {
        match self.graph.node_weight(node) {
            Some(Element::Joint(joint)) => Some(*joint),
            _ => None,
        }
    }
}
