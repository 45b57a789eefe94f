//! Fan-out helpers for work whose pieces finish on arbitrary threads.
//!
//! Both helpers hold one extra count while the input is being walked, so the
//! completion callback runs exactly once, after the last piece has reported
//! and never before the walk is over.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};

use tracing::trace;

type Callback = Box<dyn FnOnce() + Send>;

struct Interlock {
    pending: AtomicUsize,
    complete: Mutex<Option<Callback>>,
}

impl Interlock {
    fn new(pending: usize, complete: Callback) -> Arc<Self> {
        Arc::new(Interlock {
            pending: AtomicUsize::new(pending),
            complete: Mutex::new(Some(complete)),
        })
    }

    fn acquire(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            let complete = self
                .complete
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(complete) = complete {
                trace!("all pieces complete");
                complete();
            }
        }
    }
}

/// Handed to each piece of a [`fan_out`]; report once the piece is done.
pub struct Completion {
    interlock: Arc<Interlock>,
}

impl Completion {
    pub fn complete(self) {
        self.interlock.release();
    }
}

/// Call `process` on every item with its index, then run `complete` once every
/// item's [`Completion`] has been reported. With no items, `complete` runs
/// before this returns.
pub fn fan_out<T, I, P, C>(input: I, mut process: P, complete: C)
where
    I: IntoIterator<Item = T>,
    P: FnMut(T, usize, Completion),
    C: FnOnce() + Send + 'static,
{
    let interlock = Interlock::new(1, Box::new(complete));
    for (index, item) in input.into_iter().enumerate() {
        interlock.acquire();
        process(
            item,
            index,
            Completion {
                interlock: interlock.clone(),
            },
        );
    }
    interlock.release();
}

/// Where a piece of a [`fan_out_map`] stores its output.
pub struct Slot<R> {
    index: usize,
    slots: Arc<[Mutex<Option<R>>]>,
    interlock: Arc<Interlock>,
}

impl<R> Slot<R> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set(self, value: R) {
        *self.slots[self.index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.interlock.release();
    }
}

/// Map every item through `process`, which may fill its [`Slot`] on any
/// thread, then hand the outputs to `emit` in input order.
pub fn fan_out_map<T, R, P, E>(input: Vec<T>, mut process: P, emit: E)
where
    R: Send + 'static,
    P: FnMut(T, usize, Slot<R>),
    E: FnOnce(Vec<R>) + Send + 'static,
{
    let slots: Arc<[Mutex<Option<R>>]> = input.iter().map(|_| Mutex::new(None)).collect();
    let results = slots.clone();
    let interlock = Interlock::new(
        input.len() + 1,
        Box::new(move || {
            let values = results
                .iter()
                .filter_map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).take())
                .collect();
            emit(values)
        }),
    );
    for (index, item) in input.into_iter().enumerate() {
        process(
            item,
            index,
            Slot {
                index,
                slots: slots.clone(),
                interlock: interlock.clone(),
            },
        );
    }
    interlock.release();
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::mpsc, thread};

    #[test]
    fn empty_input_completes_immediately() {
        let (sender, receiver) = mpsc::channel();
        fan_out(Vec::<u8>::new(), |_, _, _| unreachable!(), move || {
            sender.send(()).unwrap()
        });
        assert!(receiver.try_recv().is_ok());

        let (sender, receiver) = mpsc::channel();
        fan_out_map(Vec::<u8>::new(), |_, _, _: Slot<u8>| unreachable!(), move |values| {
            sender.send(values).unwrap()
        });
        assert_eq!(receiver.try_recv().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn completes_after_last_piece() {
        let (sender, receiver) = mpsc::channel();
        let mut held = Vec::new();
        fan_out(0..5, |_, _, completion| held.push(completion), move || {
            sender.send(()).unwrap()
        });
        assert!(receiver.try_recv().is_err());
        while let Some(completion) = held.pop() {
            assert!(receiver.try_recv().is_err());
            completion.complete();
        }
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn single_item_completes_synchronously() {
        let (sender, receiver) = mpsc::channel();
        fan_out(
            Some("only"),
            |item, index, completion| {
                assert_eq!((item, index), ("only", 0));
                completion.complete()
            },
            move || sender.send(()).unwrap(),
        );
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn map_preserves_input_order() {
        let (sender, receiver) = mpsc::channel();
        let mut slots = Vec::new();
        fan_out_map(
            vec![1, 2, 3, 4, 5],
            |item, index, slot| {
                assert_eq!(slot.index(), index);
                slots.push((item, slot))
            },
            move |values: Vec<i32>| sender.send(values).unwrap(),
        );
        while let Some((item, slot)) = slots.pop() {
            assert!(receiver.try_recv().is_err());
            slot.set(item * 10);
        }
        assert_eq!(receiver.recv().unwrap(), [10, 20, 30, 40, 50]);
    }

    #[test]
    fn map_across_threads() {
        let (sender, receiver) = mpsc::channel();
        let mut workers = Vec::new();
        fan_out_map(
            (0..8).collect(),
            |item: u64, _, slot| {
                workers.push(thread::spawn(move || slot.set(item * item)));
            },
            move |values: Vec<u64>| sender.send(values).unwrap(),
        );
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(receiver.recv().unwrap(), [0, 1, 4, 9, 16, 25, 36, 49]);
    }
}
