/// Earley recognizer.
///
/// Set `i` holds the items that have consumed tokens `0..i`. Each set is closed with prediction and completion, then
/// the token at `i` is scanned into set `i + 1`.
///
/// ## Notes
/// - Nullable nonterminals use the Aycock-Horspool fix: predicting a nullable symbol immediately advances the
///   predicting item as well, so empty completions never need to revisit earlier items of the same set.
/// - A completed item is shown to the reduce checks when it is first added. A rejected item is remembered as seen
///   (so it is not re-derived) but never enters the set, and nothing is ever advanced over it.
/// - The Aycock-Horspool shortcut advances over a nullable symbol without consulting the checks, so no check may be
///   registered for a nullable symbol.
#[derive(Debug, Default)]
struct EarleySet {
    items: Vec<Item>,
    seen: HashSet<Item>,
    /// Next symbol → indices of the items waiting on it.
    waiting: HashMap<SymbolId, Vec<usize>>,
}

/// Chart plus the completions accepted so far.
struct Recognizer<'p> {
    grammar: &'p CompiledGrammar<'p>,
    tokens: &'p [Token],
    checks: &'p ReduceChecks,
    sets: Vec<EarleySet>,
    /// `(lhs, end)` → `(origin, rule)` of every accepted completion, in the order they were added.
    completed: HashMap<(SymbolId, usize), Vec<(usize, RuleId)>>,
    rejected: usize,
}

impl<'p> Recognizer<'p> {
    fn new(grammar: &'p CompiledGrammar<'p>, tokens: &'p [Token], checks: &'p ReduceChecks) -> Self {
        Self {
            grammar,
            tokens,
            checks,
            sets: (0..=tokens.len()).map(|_| EarleySet::default()).collect(),
            completed: HashMap::new(),
            rejected: 0,
        }
    }

    /// Fill the chart. Returns the index of the last non-empty set.
    fn run(&mut self) -> usize {
        let grammar = self.grammar;
        let Some(goal) = grammar.goal else {
            return 0;
        };
        for &rule in grammar.rules_for(goal) {
            self.add(0, Item { rule, dot: 0, origin: 0 });
        }
        let mut furthest = 0;
        for i in 0..self.sets.len() {
            if self.sets[i].items.is_empty() {
                break;
            }
            furthest = i;
            self.close(i);
            if i < self.tokens.len() {
                self.scan(i);
            }
        }
        tracing::debug!(
            furthest,
            items = self.sets.iter().map(|s| s.items.len()).sum::<usize>(),
            rejected = self.rejected,
            "chart filled"
        );
        furthest
    }

    /// Add `item` to set `at`, running the reduce check first if it is complete.
    fn add(&mut self, at: usize, item: Item) {
        if !self.sets[at].seen.insert(item) {
            return;
        }
        let grammar = self.grammar;
        let rule = &grammar.rules[item.rule as usize];
        let dot = item.dot as usize;
        if dot == rule.rhs.len() {
            let production = &grammar.grammar.productions()[item.rule as usize];
            let ctx = ReduceContext::new(production, self.tokens, item.origin as usize, at);
            if !self.checks.accepts(&ctx) {
                self.rejected += 1;
                tracing::trace!(rule = %production, first = item.origin, last = at, "reduction rejected");
                return;
            }
            self.completed
                .entry((rule.lhs, at))
                .or_default()
                .push((item.origin as usize, item.rule));
        }
        let set = &mut self.sets[at];
        if let Some(&next) = rule.rhs.get(dot) {
            set.waiting.entry(next).or_default().push(set.items.len());
        }
        set.items.push(item);
    }

    fn close(&mut self, i: usize) {
        let grammar = self.grammar;
        let mut k = 0;
        while k < self.sets[i].items.len() {
            let item = self.sets[i].items[k];
            k += 1;
            let rule = &grammar.rules[item.rule as usize];
            match rule.rhs.get(item.dot as usize) {
                None => self.complete(i, item.origin as usize, rule.lhs),
                Some(&sym) if grammar.is_nonterminal(sym) => {
                    for &predicted in grammar.rules_for(sym) {
                        self.add(
                            i,
                            Item {
                                rule: predicted,
                                dot: 0,
                                origin: i as u32,
                            },
                        );
                    }
                    if grammar.nullable.contains(&sym) {
                        self.add(i, item.advance());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Advance every item of set `origin` that waits on `lhs` into set `i`.
    fn complete(&mut self, i: usize, origin: usize, lhs: SymbolId) {
        let mut w = 0;
        while let Some(&idx) = self.sets[origin].waiting.get(&lhs).and_then(|v| v.get(w)) {
            w += 1;
            let parent = self.sets[origin].items[idx];
            self.add(i, parent.advance());
        }
    }

    fn scan(&mut self, i: usize) {
        let Some(terminal) = self.grammar.terminal_for(&self.tokens[i].kind) else {
            return;
        };
        let Some(waiting) = self.sets[i].waiting.get(&terminal) else {
            return;
        };
        let advanced: Vec<Item> = waiting.iter().map(|&idx| self.sets[i].items[idx].advance()).collect();
        for item in advanced {
            self.add(i + 1, item);
        }
    }

    /// Terminals the parser could have accepted at set `at`.
    fn expected(&self, at: usize) -> Vec<String> {
        let grammar = self.grammar;
        let names: BTreeSet<&str> = self.sets[at]
            .waiting
            .keys()
            .filter(|&&sym| !grammar.is_nonterminal(sym))
            .map(|&sym| grammar.name(sym))
            // Nonterminals that only synthesis would define (`call`, `build_tuple`) have no rules here.
            .filter(|name| !name.bytes().any(|b| b.is_ascii_lowercase()))
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Build the error for a stream that could not be reduced to the goal.
    fn error(&self, furthest: usize) -> ParseError {
        let expected = self.expected(furthest);
        if self.tokens.is_empty() {
            return ParseError::new("<end of input>", "", 0).with_expected(expected);
        }
        let index = furthest.min(self.tokens.len() - 1);
        let token = &self.tokens[index];
        let lo = index.saturating_sub(3);
        let hi = (index + 4).min(self.tokens.len());
        let window = self.tokens[lo..hi].iter().map(ToString::to_string).collect();
        ParseError::new(token.kind.clone(), token.offset.to_string(), index)
            .with_window(window)
            .with_expected(expected)
    }
}
