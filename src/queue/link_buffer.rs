//! 链路缓冲
//!
//! 每条链路两个方向各一个 FIFO，字节容量由两个方向共享。
//! 入队记录时间戳；出队时按 avg ← (avg + dwell) / 2 更新平均驻留时延，
//! 该值是动态路由开销的动态分量。

use std::collections::VecDeque;

use crate::net::{Direction, Packet};
use crate::sim::SimTime;

#[derive(Debug)]
struct Queued {
    pkt: Packet,
    enqueued_at: SimTime,
}

/// 链路的双方向 DropTail 缓冲。
#[derive(Debug)]
pub struct LinkBuffer {
    cap_bytes: u64,
    cur_bytes: u64,
    q: [VecDeque<Queued>; 2],
    dwell_avg_ms: f64,
}

impl LinkBuffer {
    pub fn new(cap_bytes: u64) -> Self {
        Self {
            cap_bytes,
            cur_bytes: 0,
            q: [VecDeque::new(), VecDeque::new()],
            dwell_avg_ms: 0.0,
        }
    }

    /// 入队：成功返回 Ok；容量不足时返回 Err(pkt)，由链路记一次丢包。
    pub fn enqueue(&mut self, pkt: Packet, dir: Direction, now: SimTime) -> Result<(), Packet> {
        let sz = pkt.size();
        if self.cur_bytes.saturating_add(sz) > self.cap_bytes {
            return Err(pkt);
        }
        self.cur_bytes = self.cur_bytes.saturating_add(sz);
        self.q[dir.index()].push_back(Queued {
            pkt,
            enqueued_at: now,
        });
        Ok(())
    }

    /// 出队：返回该方向的队头，并把驻留时延并入移动平均。
    pub fn dequeue(&mut self, dir: Direction, now: SimTime) -> Option<Packet> {
        let item = self.q[dir.index()].pop_front()?;
        self.cur_bytes = self.cur_bytes.saturating_sub(item.pkt.size());
        let dwell_ms = now.saturating_sub(item.enqueued_at).as_millis_f64();
        self.dwell_avg_ms = (self.dwell_avg_ms + dwell_ms) / 2.0;
        Some(item.pkt)
    }

    pub fn len(&self, dir: Direction) -> usize {
        self.q[dir.index()].len()
    }

    pub fn total_len(&self) -> usize {
        self.q[0].len() + self.q[1].len()
    }

    pub fn is_empty(&self, dir: Direction) -> bool {
        self.q[dir.index()].is_empty()
    }

    pub fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.cap_bytes
    }

    /// 当前平均驻留时延（ms）。路由刷新前读取作为快照。
    pub fn dwell_avg_ms(&self) -> f64 {
        self.dwell_avg_ms
    }

    /// 动态路由表生效后清零计量。
    pub fn reset_dwell(&mut self) {
        self.dwell_avg_ms = 0.0;
    }
}
