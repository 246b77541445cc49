//! The Pike-VM simulation loop.
//!
//! Execution branches are modeled as logical threads carrying a program
//! counter and their own capture registers. Threads are explored depth-first
//! off a LIFO stack, which realizes the leftmost-alternative-first,
//! greedy-quantifier-first priority order encoded by the compiler; a
//! per-position memo of visited program counters bounds the total work per
//! input symbol to the program length.

use std::collections::HashMap;

use crate::{
    is_line_terminator, is_word_symbol, AssertionKind, ExecutionError, InstIndex, Instructions,
    Opcode,
};

/// The capture registers of a single execution branch: a start/end slot pair
/// for the whole match followed by one pair per save group. A slot is `None`
/// until its save instruction executes; an end slot is only meaningful once
/// its start slot is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlots(Vec<Option<usize>>);

impl SaveSlots {
    /// Returns an all-unset register set sized for the given number of save
    /// groups plus the implicit whole-match group.
    pub fn unset(save_groups: usize) -> Self {
        Self(vec![None; (save_groups + 1) * 2])
    }

    /// Returns the number of groups addressed by the registers, including the
    /// whole-match group 0.
    pub fn groups(&self) -> usize {
        self.0.len() / 2
    }

    /// Returns the completed `(start, end)` pair for a group, or `None` if
    /// either register is unset. A `(n, n)` pair is a valid zero-width
    /// capture, distinct from an unset one.
    pub fn group(&self, group: usize) -> Option<(usize, usize)> {
        match self.pair(group) {
            Ok((Some(start), Some(end))) => Some((start, end)),
            _ => None,
        }
    }

    fn pair(&self, group: usize) -> Result<(Option<usize>, Option<usize>), ExecutionError> {
        match (self.0.get(group * 2), self.0.get(group * 2 + 1)) {
            (Some(&start), Some(&end)) => Ok((start, end)),
            _ => Err(ExecutionError::SaveSlotOutOfBounds(group)),
        }
    }

    fn set_start(&mut self, group: usize, at: usize) -> Result<(), ExecutionError> {
        let slot = self
            .0
            .get_mut(group * 2)
            .ok_or(ExecutionError::SaveSlotOutOfBounds(group))?;
        *slot = Some(at);
        Ok(())
    }

    fn set_end(&mut self, group: usize, at: usize) -> Result<(), ExecutionError> {
        let slot = self
            .0
            .get_mut(group * 2 + 1)
            .ok_or(ExecutionError::SaveSlotOutOfBounds(group))?;
        *slot = Some(at);
        Ok(())
    }
}

/// A single execution branch of the simulation.
///
/// Forking deep-copies the registers so that sibling branches never alias
/// each other's captures. `backref_offset` counts the symbols of the
/// referenced capture already compared while blocked on a [Opcode::Backref].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pc: InstIndex,
    slots: SaveSlots,
    backref_offset: usize,
}

impl Thread {
    pub fn new(pc: InstIndex, slots: SaveSlots) -> Self {
        Self {
            pc,
            slots,
            backref_offset: 0,
        }
    }
}

/// Executes a program against an input symbol sequence from a start offset.
///
/// All scratch state (thread stacks, memo tables) lives on the interpreter
/// and is reset per match attempt, keeping each attempt a pure function of
/// `(program, input, start index)`.
#[derive(Debug)]
pub struct Interpreter<'a> {
    program: &'a Instructions,
    input: &'a [u32],
    input_index: usize,
    active: Vec<Thread>,
    blocked: Vec<Thread>,
    best: Option<SaveSlots>,
    /// Last input index at which each pc was expanded.
    pc_last_input_index: Vec<Option<usize>>,
    /// Backreference expansion depends on the captured text, so its memo key
    /// carries the referenced group's register pair alongside the pc.
    backref_last_input_index: HashMap<(u32, Option<usize>, Option<usize>), usize>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Instructions, input: &'a [u32], start_index: usize) -> Self {
        Self {
            program,
            input,
            input_index: start_index,
            active: vec![],
            blocked: vec![],
            best: None,
            pc_last_input_index: vec![None; program.len()],
            backref_last_input_index: HashMap::new(),
        }
    }

    fn opcode_at(&self, pc: InstIndex) -> Result<&Opcode, ExecutionError> {
        self.program
            .get(pc)
            .ok_or(ExecutionError::PcOutOfBounds(pc.as_u32()))
    }

    /// Records the expansion of a thread's pc at the current input index,
    /// returning false if it was already expanded here.
    fn mark_expanded(&mut self, thread: &Thread) -> Result<bool, ExecutionError> {
        if let Opcode::Backref(inst) = self.opcode_at(thread.pc)? {
            let (start, end) = thread.slots.pair(inst.group)?;
            let key = (thread.pc.as_u32(), start, end);
            if self.backref_last_input_index.get(&key) == Some(&self.input_index) {
                return Ok(false);
            }
            self.backref_last_input_index.insert(key, self.input_index);
        } else {
            let seen = &mut self.pc_last_input_index[thread.pc.as_usize()];
            if *seen == Some(self.input_index) {
                return Ok(false);
            }
            *seen = Some(self.input_index);
        }

        Ok(true)
    }

    fn assertion_holds(&self, kind: AssertionKind) -> bool {
        let at = self.input_index;
        match kind {
            AssertionKind::StartOfInput => at == 0,
            AssertionKind::EndOfInput => at == self.input.len(),
            AssertionKind::StartOfLine => at == 0 || is_line_terminator(self.input[at - 1]),
            AssertionKind::EndOfLine => {
                at == self.input.len() || is_line_terminator(self.input[at])
            }
            AssertionKind::WordBoundary => self.at_word_boundary(),
            AssertionKind::NonWordBoundary => !self.at_word_boundary(),
        }
    }

    fn at_word_boundary(&self) -> bool {
        let before = self
            .input_index
            .checked_sub(1)
            .map(|i| is_word_symbol(self.input[i]))
            .unwrap_or(false);
        let after = self
            .input
            .get(self.input_index)
            .map(|&symbol| is_word_symbol(symbol))
            .unwrap_or(false);

        before != after
    }

    fn run_active_threads(&mut self) -> Result<(), ExecutionError> {
        while let Some(thread) = self.active.pop() {
            self.run_thread(thread)?;
        }

        Ok(())
    }

    /// Executes a thread inline until it blocks on input, fails, or accepts.
    fn run_thread(&mut self, mut thread: Thread) -> Result<(), ExecutionError> {
        loop {
            if !self.mark_expanded(&thread)? {
                return Ok(());
            }

            match self.opcode_at(thread.pc)?.clone() {
                Opcode::Jmp(inst) => {
                    thread.pc = inst.next;
                }
                Opcode::Fork(inst) => {
                    // The clone waits at the branch target while the
                    // original continues inline, keeping the fall-through
                    // path ahead in priority order.
                    self.active.push(Thread::new(inst.to, thread.slots.clone()));
                    thread.pc = thread.pc + 1;
                }
                Opcode::ConsumeRange(_) => {
                    self.blocked.push(thread);
                    return Ok(());
                }
                Opcode::Backref(inst) => match thread.slots.group(inst.group) {
                    Some((start, end)) if start < end => {
                        thread.backref_offset = 0;
                        self.blocked.push(thread);
                        return Ok(());
                    }
                    // An unset or empty capture is reproduced by zero
                    // symbols.
                    _ => {
                        thread.pc = thread.pc + 1;
                    }
                },
                Opcode::Assertion(inst) => {
                    if !self.assertion_holds(inst.kind) {
                        return Ok(());
                    }
                    thread.pc = thread.pc + 1;
                }
                Opcode::StartSave(inst) => {
                    thread.slots.set_start(inst.slot_id, self.input_index)?;
                    thread.pc = thread.pc + 1;
                }
                Opcode::EndSave(inst) => {
                    thread.slots.set_end(inst.slot_id, self.input_index)?;
                    thread.pc = thread.pc + 1;
                }
                Opcode::Match => {
                    // Lower-priority active threads can no longer win.
                    // Blocked threads were queued before this accept and so
                    // outrank it; any later accept of theirs replaces this
                    // one.
                    self.active.clear();
                    log::trace!(
                        "accept at input index {} with registers {:?}",
                        self.input_index,
                        thread.slots
                    );
                    self.best = Some(thread.slots);
                    return Ok(());
                }
            }
        }
    }

    /// Offers one input symbol to every blocked thread, in original priority
    /// order. Threads whose range test or backreference comparison fails are
    /// dropped; the rest re-queue as active or, for a part-way backreference
    /// comparison, stay blocked.
    fn flush_blocked_threads(&mut self, symbol: u32) -> Result<(), ExecutionError> {
        let blocked = std::mem::take(&mut self.blocked);
        let mut woken = Vec::with_capacity(blocked.len());

        for mut thread in blocked {
            match self.opcode_at(thread.pc)?.clone() {
                Opcode::ConsumeRange(inst) => {
                    if symbol >= inst.min && symbol <= inst.max {
                        thread.pc = thread.pc + 1;
                        woken.push(thread);
                    }
                }
                Opcode::Backref(inst) => {
                    let (start, end) = thread
                        .slots
                        .group(inst.group)
                        .ok_or(ExecutionError::UnsetBackreference(thread.pc.as_u32()))?;

                    if symbol == self.input[start + thread.backref_offset] {
                        thread.backref_offset += 1;
                        if start + thread.backref_offset == end {
                            thread.backref_offset = 0;
                            thread.pc = thread.pc + 1;
                            woken.push(thread);
                        } else {
                            self.blocked.push(thread);
                        }
                    }
                }
                _ => return Err(ExecutionError::BlockedOnNonConsuming(thread.pc.as_u32())),
            }
        }

        // Woken threads re-queue in reverse so that popping the LIFO stack
        // yields them in their original priority order.
        self.active.extend(woken.into_iter().rev());

        Ok(())
    }

    /// Searches for a match beginning exactly at the current input index,
    /// consuming input until the search space is exhausted or a match has
    /// been accepted with no blocked thread left to outrank it.
    pub fn find_next_match(&mut self) -> Result<Option<SaveSlots>, ExecutionError> {
        self.best = None;
        self.active.clear();
        self.blocked.clear();
        self.pc_last_input_index.fill(None);
        self.backref_last_input_index.clear();

        self.active.push(Thread::new(
            InstIndex::from(0),
            SaveSlots::unset(self.program.save_groups()),
        ));
        self.run_active_threads()?;

        while self.input_index != self.input.len()
            && !(self.best.is_some() && self.blocked.is_empty())
        {
            let symbol = self.input[self.input_index];
            self.input_index += 1;
            self.flush_blocked_threads(symbol)?;
            self.run_active_threads()?;
        }

        Ok(self.best.clone())
    }

    /// Repeatedly invokes [Self::find_next_match], resuming after each match
    /// per the empty-match rule: a non-empty match resumes at its end, a
    /// zero-width match one symbol past its end, and iteration stops once the
    /// resume position reaches the end of input.
    pub fn find_matches(&mut self, max_count: usize) -> Result<Vec<SaveSlots>, ExecutionError> {
        let mut found = Vec::new();

        while found.len() < max_count {
            let slots = match self.find_next_match()? {
                Some(slots) => slots,
                None => break,
            };
            let (start, end) = slots.group(0).ok_or(ExecutionError::UnmarkedMatch)?;
            found.push(slots);

            if end != start {
                self.input_index = end;
            } else if end == self.input.len() {
                break;
            } else {
                self.input_index = end + 1;
            }

            if self.input_index >= self.input.len() {
                break;
            }
        }

        Ok(found)
    }
}
