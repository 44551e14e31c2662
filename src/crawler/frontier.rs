//! Crawl frontier: pending queue, visited set and page budget
//!
//! `CrawlState` is owned by the coordinator loop alone. Fetch pipelines never
//! touch it; they hand their discovered links back to the loop, which makes
//! the check-and-mark of the visited set free of races.

use super::fetcher::FetchTask;
use std::collections::{HashSet, VecDeque};

/// Why a task was not added to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooDeep,
    AlreadySeen,
    BudgetExhausted,
}

#[derive(Debug)]
pub struct CrawlState {
    /// FIFO queue, so pages are visited breadth-first
    pending: VecDeque<FetchTask>,
    /// Normalized key of every task ever queued; keeps duplicates out of `pending`
    queued: HashSet<String>,
    /// Normalized keys of tasks dispatched to a pipeline
    visited: HashSet<String>,
    max_depth: u32,
    page_budget: u32,
}

impl CrawlState {
    pub fn new(max_depth: u32, page_budget: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_depth,
            page_budget,
        }
    }

    /// Queues a task unless it is too deep, already known, or over budget
    pub fn enqueue(&mut self, task: FetchTask) -> Result<(), Rejection> {
        if task.depth > self.max_depth {
            return Err(Rejection::TooDeep);
        }
        if self.budget_exhausted() {
            return Err(Rejection::BudgetExhausted);
        }
        if !self.queued.insert(task.key.clone()) {
            return Err(Rejection::AlreadySeen);
        }

        self.pending.push_back(task);
        Ok(())
    }

    /// Takes the next task and marks it visited
    ///
    /// Returns `None` when the queue is empty or the budget is spent.
    pub fn next_task(&mut self) -> Option<FetchTask> {
        while !self.budget_exhausted() {
            let task = self.pending.pop_front()?;
            if self.visited.insert(task.key.clone()) {
                return Some(task);
            }
        }
        None
    }

    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.page_budget as usize
    }

    pub fn budget_remaining(&self) -> u32 {
        self.page_budget.saturating_sub(self.visited.len() as u32)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
