/// Interned grammar and chart item types.
///
/// This chunk turns a [`Grammar`] into integer symbols and rules so the chart can hash and compare items cheaply.
///
/// ## Notes
/// - Rule ids are production indices: rule `r` here is `grammar.productions()[r]`, which is what makes "declared
///   first" comparable as a plain integer.
/// - A symbol is a nonterminal iff some production has it as left-hand side; every other symbol is matched against
///   token kinds.
type SymbolId = u32;
type RuleId = u32;

#[derive(Debug)]
struct CompiledRule {
    lhs: SymbolId,
    rhs: Vec<SymbolId>,
}

/// A grammar with interned symbols.
struct CompiledGrammar<'g> {
    grammar: &'g Grammar,
    names: Vec<&'g str>,
    ids: HashMap<&'g str, SymbolId>,
    rules: Vec<CompiledRule>,
    by_lhs: HashMap<SymbolId, Vec<RuleId>>,
    nullable: HashSet<SymbolId>,
    goal: Option<SymbolId>,
}

fn intern<'g>(names: &mut Vec<&'g str>, ids: &mut HashMap<&'g str, SymbolId>, name: &'g str) -> SymbolId {
    *ids.entry(name).or_insert_with(|| {
        names.push(name);
        (names.len() - 1) as SymbolId
    })
}

impl<'g> CompiledGrammar<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let mut names = Vec::new();
        let mut ids = HashMap::new();
        let mut rules = Vec::with_capacity(grammar.len());
        let mut by_lhs: HashMap<SymbolId, Vec<RuleId>> = HashMap::new();
        for (r, production) in grammar.productions().iter().enumerate() {
            let lhs = intern(&mut names, &mut ids, &production.lhs);
            let rhs = production
                .rhs
                .iter()
                .map(|sym| intern(&mut names, &mut ids, sym))
                .collect();
            by_lhs.entry(lhs).or_default().push(r as RuleId);
            rules.push(CompiledRule { lhs, rhs });
        }
        let goal = ids.get(grammar.goal()).copied();

        // Fixpoint: a symbol is nullable if some rule for it has only nullable symbols on the right.
        let mut nullable = HashSet::new();
        loop {
            let before = nullable.len();
            for rule in &rules {
                if !nullable.contains(&rule.lhs) && rule.rhs.iter().all(|s| nullable.contains(s)) {
                    nullable.insert(rule.lhs);
                }
            }
            if nullable.len() == before {
                break;
            }
        }

        Self {
            grammar,
            names,
            ids,
            rules,
            by_lhs,
            nullable,
            goal,
        }
    }

    fn is_nonterminal(&self, sym: SymbolId) -> bool {
        self.by_lhs.contains_key(&sym)
    }

    fn rules_for(&self, sym: SymbolId) -> &[RuleId] {
        self.by_lhs.get(&sym).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The terminal symbol a token kind matches, if the grammar mentions it at all.
    fn terminal_for(&self, kind: &str) -> Option<SymbolId> {
        self.ids.get(kind).copied().filter(|&sym| !self.is_nonterminal(sym))
    }

    fn name(&self, sym: SymbolId) -> &'g str {
        self.names[sym as usize]
    }

    fn has_tag(&self, sym: SymbolId, tag: Tag) -> bool {
        self.grammar.has_tag(self.name(sym), tag)
    }
}

/// Earley item: `rule` with `dot` symbols recognized, started at token `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    rule: RuleId,
    dot: u32,
    origin: u32,
}

impl Item {
    fn advance(self) -> Item {
        Item {
            dot: self.dot + 1,
            ..self
        }
    }
}
