// implementation of the buffer.
//
// values flow through a pipeline of worker tasks, each joined to the next by a channel:
//
//   put ---> admission ---> intake input ---> intake coordinator
//                           (unbounded)            |
//                                                  | push, then pulse
//                                                  v
//                                            shared store <--- availability signal
//                                                  |                (capacity 1)
//                                                  | pull
//                                                  v
//   get <--- output channel <--------------- output dispatcher
//            (capacity 1)
//
// and a shutdown coordinator task which, once cancelled, waits for the outstanding count to reach
// zero and then closes the intake input. closing the intake input cascades down the pipeline:
//
//   intake input closed -> intake coordinator exits -> availability signal closed
//   -> dispatcher drains the store and exits -> output channel closed -> get resolves to None
//
// the organization of these modules is as such:
//
//      store<-----------core: shared state (store, intake guard, counters, closed flag) and the
//                       ^     operations on it which need to stay consistent with each other:
//                       |     admission (the synchronous put path) and closing.
//                       |
//      intake-----------|     intake coordinator task.
//      dispatch---------|     output dispatcher task.
//      shutdown---------/     shutdown coordinator task.
//
//      polling<---------api: the exposed API. builds the pipeline, owns the worker tasks, adapts
//      cancel<-------/       the output channel into futures which may also be blocked on.
//
// there is also the error module, which contains the relevant error types, which is also
// re-exported publically.

pub(crate) mod api;
pub(crate) mod error;

mod cancel;
mod core;
mod dispatch;
mod intake;
mod polling;
mod shutdown;
mod store;
