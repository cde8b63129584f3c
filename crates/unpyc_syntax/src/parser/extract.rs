/// Derivation extraction and tree building.
///
/// Extraction walks the accepted completions top-down with an explicit stack, choosing for every `(symbol, start,
/// end)` the lowest-numbered accepted rule and splitting its right-hand side from right to left. Building then runs
/// over the chosen derivation nodes in reverse creation order, so every child exists before its parent.
///
/// ## Notes
/// - A split for nonterminal `X` at position `m` of rule `R` ending at `pos` is valid when `(X, k, pos)` was accepted
///   and the prefix item `R` with dot `m` started at `start` is in set `k`.
/// - The grammar is free of unit cycles, so the same `(symbol, start, end)` never appears twice on one path.

/// One node of the chosen derivation.
#[derive(Debug)]
struct Derivation {
    rule: RuleId,
    start: usize,
    end: usize,
    children: Vec<Part>,
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Token(usize),
    Node(usize),
}

/// Child of a rule instance before it is expanded.
enum Split {
    Leaf(usize),
    Node(SymbolId, usize, usize),
}

impl<'p> Recognizer<'p> {
    /// Lowest-numbered accepted rule deriving `sym` over `start..end`.
    fn best_rule(&self, sym: SymbolId, start: usize, end: usize) -> Option<RuleId> {
        self.completed
            .get(&(sym, end))?
            .iter()
            .filter(|&&(origin, _)| origin == start)
            .map(|&(_, rule)| rule)
            .min()
    }

    /// Split an accepted instance of `rule` over `start..end` into its children.
    fn split(&self, rule: RuleId, start: usize, end: usize) -> Option<Vec<Split>> {
        let grammar = self.grammar;
        let rhs = &grammar.rules[rule as usize].rhs;
        let mut parts = Vec::with_capacity(rhs.len());
        let mut pos = end;
        for (m, &sym) in rhs.iter().enumerate().rev() {
            if !grammar.is_nonterminal(sym) {
                pos = pos.checked_sub(1)?;
                parts.push(Split::Leaf(pos));
                continue;
            }
            let prefix = Item {
                rule,
                dot: m as u32,
                origin: start as u32,
            };
            let k = self
                .completed
                .get(&(sym, pos))?
                .iter()
                .map(|&(origin, _)| origin)
                .find(|&origin| origin >= start && self.sets[origin].seen.contains(&prefix))?;
            parts.push(Split::Node(sym, k, pos));
            pos = k;
        }
        if pos != start {
            return None;
        }
        parts.reverse();
        Some(parts)
    }

    /// Choose one derivation of the goal over the whole stream.
    fn derive(&self) -> Option<Vec<Derivation>> {
        let goal = self.grammar.goal?;
        let end = self.tokens.len();
        let rule = self.best_rule(goal, 0, end)?;
        let mut nodes = vec![Derivation {
            rule,
            start: 0,
            end,
            children: Vec::new(),
        }];
        let mut stack = vec![0usize];
        while let Some(current) = stack.pop() {
            let (rule, start, end) = (nodes[current].rule, nodes[current].start, nodes[current].end);
            let mut children = Vec::new();
            for split in self.split(rule, start, end)? {
                match split {
                    Split::Leaf(index) => children.push(Part::Token(index)),
                    Split::Node(sym, s, e) => {
                        let rule = self.best_rule(sym, s, e)?;
                        nodes.push(Derivation {
                            rule,
                            start: s,
                            end: e,
                            children: Vec::new(),
                        });
                        let id = nodes.len() - 1;
                        stack.push(id);
                        children.push(Part::Node(id));
                    }
                }
            }
            nodes[current].children = children;
        }
        Some(nodes)
    }

    /// Build the syntax tree for a chosen derivation.
    fn build(&self, nodes: &[Derivation]) -> Option<SyntaxTree> {
        let grammar = self.grammar;
        let mut builder = TreeBuilder::new();
        let mut built: Vec<Option<NodeId>> = vec![None; nodes.len()];
        for (d, node) in nodes.iter().enumerate().rev() {
            let lhs = grammar.rules[node.rule as usize].lhs;
            let label = grammar.name(lhs);
            let mut kids = Vec::with_capacity(node.children.len());
            for part in &node.children {
                match *part {
                    Part::Token(index) => kids.push(builder.leaf(self.tokens[index].kind.clone(), index)),
                    Part::Node(child) => kids.push(built[child]?),
                }
            }
            let flattens = grammar.has_tag(lhs, Tag::Collect)
                && kids
                    .first()
                    .is_some_and(|&first| !builder.is_leaf(first) && builder.label(first) == label);
            let id = if flattens {
                let acc = kids[0];
                builder.append(acc, kids[1..].iter().copied());
                acc
            } else if kids.len() == 1 && (grammar.has_tag(lhs, Tag::Singleton) || grammar.has_tag(lhs, Tag::Optional)) {
                kids[0]
            } else {
                builder.node(label, kids, Span::new(node.start, node.start))
            };
            built[d] = Some(id);
        }
        let root = (*built.first()?)?;
        Some(builder.finish(root, self.tokens.to_vec()))
    }

    /// Extract the tree, or `None` if the goal does not span the stream.
    fn extract(&self) -> Option<SyntaxTree> {
        let nodes = self.derive()?;
        tracing::debug!(derivation_nodes = nodes.len(), "derivation chosen");
        self.build(&nodes)
    }
}
