use crate::domain::campaign::Campaign;
use std::io::Write;

/// Writes one summary row per campaign after a replay run.
pub struct CampaignWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CampaignWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_summaries(&mut self, rows: &[(Campaign, usize)]) -> Result<(), csv::Error> {
        self.writer
            .write_record(["campaign", "goal", "raised", "percent", "status", "pledges"])?;
        for (campaign, pledge_count) in rows {
            self.writer.write_record([
                campaign.title.as_str(),
                &campaign.goal_amount.normalize().to_string(),
                &campaign.current_amount.normalize().to_string(),
                &campaign.funding_percentage().round_dp(1).normalize().to_string(),
                &campaign.status.to_string(),
                &pledge_count.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
